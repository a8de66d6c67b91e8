//! String-labelled enums shared by the domain model and the storage layer.

use thiserror::Error;

/// Returned when a stored or upstream label does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: '{value}'")]
pub struct UnknownLabel {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a fieldless enum whose variants map 1:1 onto lowercase labels.
///
/// Generates `as_str`, `ALL`, `Display`, `FromStr` and serde impls that all
/// agree on the same label, so the database, YAML overrides and log output
/// never disagree about spelling.
macro_rules! labelled_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            serde::Serialize, serde::Deserialize,
        )]
        $vis enum $name {
            $( $(#[$vmeta])* #[serde(rename = $label)] $variant ),+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::label::UnknownLabel;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    other => Err($crate::label::UnknownLabel {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}
