//! Marketing analytics and reporting: channel normalization, business join,
//! efficiency metrics, rollups, KPIs, and ranked insights.

pub mod aggregation;
pub mod campaign;
pub mod dashboard;
pub mod deriver;
pub mod insights;
pub mod joiner;
pub mod kpi;
pub mod normalizer;

pub use aggregation::{AggregationResult, Dimension, Rollup, SortKey};
pub use campaign::{FilterOptions, MarketingDataset};
pub use dashboard::{DashboardSnapshot, MarketingDashboard};
pub use deriver::{safe_ratio, DerivedMetrics, MetricInputs};
pub use insights::{Insight, InsightCategory, InsightEngine, InsightPolicy, InsightScope};
pub use joiner::{join_daily, CombinedDailyRow};
pub use normalizer::RawRecord;
