//! Scoring and decision engine for autoincome.
//!
//! The pure components (scorer, pricing, performance, segmentation,
//! reinvestment planning, business plans) take their heuristics at
//! construction and `now` per call. [`Pipeline`] runs them as batches over a
//! [`autoincome_core::Store`], and [`JobRunner`] schedules those batches.

pub mod analyst;
pub mod error;
pub mod feed;
pub mod launch;
pub mod memory;
pub mod performance;
pub mod pipeline;
pub mod plan;
pub mod pricing;
pub mod reinvest;
pub mod scheduler;
pub mod scorer;
pub mod segmentation;

mod retry;

pub use analyst::{parse_proposals, GenerativeAnalyst, OpenAiAnalyst};
pub use error::EngineError;
pub use feed::{SyntheticTrendFeed, TrendFeed};
pub use memory::MemoryStore;
pub use performance::{FinancialSummary, PerformanceCalculator, ProfitReport};
pub use pipeline::{
    AutomatedReinvestment, DashboardSnapshot, OrderIntake, Pipeline, PipelineOptions,
    RecordedOrder,
};
pub use plan::BusinessPlan;
pub use pricing::PricingEngine;
pub use reinvest::{execute_plan, ExecutionSummary, ReinvestmentDecision, ReinvestmentPlanner};
pub use scheduler::{JobKind, JobOutcome, JobReport, JobRunner};
pub use scorer::{normalize_score, OpportunityScorer};
pub use segmentation::{segment_distribution, CustomerAnalytics, Segmenter, TopCustomer};
