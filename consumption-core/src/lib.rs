pub mod analytics;
pub mod db;
pub mod domain;

pub use analytics::{compute_analytics, AnalyticsSummary, MonthlyBucket};
pub use domain::{ConsumptionKind, ConsumptionRecord, User};
