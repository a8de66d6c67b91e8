//! Identifiers for simulated marketplace listings and orders.
//!
//! Every random component is drawn from the caller's [`RngCore`] so a seeded
//! generator reproduces the same SKUs, listing URLs and order numbers.

use chrono::{DateTime, Utc};
use rand::{Rng, RngCore};

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

fn base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[usize::try_from(n % 36).unwrap_or(0)]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// Lowercase base-36 token of `len` characters.
pub fn random_token(rng: &mut dyn RngCore, len: usize) -> String {
    (0..len)
        .map(|_| char::from(BASE36[rng.random_range(0..BASE36.len())]))
        .collect()
}

fn millis(now: DateTime<Utc>) -> u64 {
    u64::try_from(now.timestamp_millis()).unwrap_or(0)
}

/// `AI-<millis>-<index>-<TOKEN>`; the token keeps SKUs unique within one millisecond.
pub fn sku(rng: &mut dyn RngCore, now: DateTime<Utc>, index: usize) -> String {
    format!(
        "AI-{}-{index}-{}",
        millis(now),
        random_token(rng, 4).to_uppercase()
    )
}

pub fn listing_url(rng: &mut dyn RngCore, platform: &str) -> String {
    format!("https://{platform}.com/listing/{}", random_token(rng, 9))
}

/// `AI-<BASE36 MILLIS>-<TOKEN>`, uppercased.
pub fn order_number(rng: &mut dyn RngCore, now: DateTime<Utc>) -> String {
    format!("AI-{}-{}", base36(millis(now)), random_token(rng, 5)).to_uppercase()
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn base36_encodes() {
        assert_eq!(base36(0), "0");
        assert_eq!(base36(35), "z");
        assert_eq!(base36(36), "10");
        assert_eq!(base36(1_295), "zz");
    }

    #[test]
    fn listing_url_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let url = listing_url(&mut rng, "facebook_marketplace");
        let id = url
            .strip_prefix("https://facebook_marketplace.com/listing/")
            .unwrap();
        assert_eq!(id.len(), 9);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn seeded_rng_repeats_identifiers() {
        let now = Utc::now();
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        assert_eq!(sku(&mut a, now, 1), sku(&mut b, now, 1));
        assert_eq!(order_number(&mut a, now), order_number(&mut b, now));
    }

    #[test]
    fn order_number_is_uppercase() {
        let mut rng = StdRng::seed_from_u64(3);
        let n = order_number(&mut rng, Utc::now());
        assert!(n.starts_with("AI-"));
        assert_eq!(n, n.to_uppercase());
        assert_eq!(n.rsplit('-').next().map(str::len), Some(5));
    }

    #[test]
    fn skus_differ_by_index() {
        let now = Utc::now();
        let mut rng = StdRng::seed_from_u64(1);
        let first = sku(&mut rng, now, 0);
        let second = sku(&mut rng, now, 1);
        assert_ne!(first, second);
        assert!(first.starts_with("AI-"));
    }
}
