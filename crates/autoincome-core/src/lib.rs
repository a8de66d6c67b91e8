//! Domain model, configuration and the persistence contract for the
//! autonomous income pipeline.

#[macro_use]
mod label;

pub mod app_config;
pub mod config;
pub mod customers;
mod error;
pub mod heuristics;
pub mod opportunities;
pub mod orders;
pub mod products;
pub mod reinvestment;
pub mod store;
pub mod streams;
pub mod trends;

pub use app_config::{AnalystSettings, AppConfig, Environment, JobIntervals};
pub use config::{load_app_config, load_app_config_from_env};
pub use customers::{Customer, CustomerMetrics, NewCustomer, Segment, SegmentChange};
pub use error::ConfigError;
pub use heuristics::{load_heuristics, Heuristics};
pub use label::UnknownLabel;
pub use opportunities::{
    BusinessModel, MarketSize, Opportunity, OpportunityCandidate, OpportunityCriteria,
    OpportunityStatus,
};
pub use orders::{NewOrder, Order, OrderStatus};
pub use products::{NewProduct, Product, ProductStatus};
pub use reinvestment::{Priority, Recommendation, ReinvestmentLog, Strategy};
pub use store::{ActivityLog, DashboardCounts, Store, StoreError};
pub use streams::{IncomeStream, NewStream, StreamMetrics, StreamStatus};
pub use trends::{CompetitionLevel, NewTrend, Trend};
