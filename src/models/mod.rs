pub mod anomaly;
pub mod order;
pub mod pattern;
pub mod pricing;
pub mod spend;

pub use anomaly::{AnomalyKind, OrderAnomaly};
pub use order::OrderObservation;
pub use pattern::{PatternOutcome, PurchasePattern};
pub use pricing::{BenchmarkStats, BranchPrice, PriceSnapshot, PriceVarianceReport};
pub use spend::{BranchSpending, ConsolidationBranch, ConsolidationOpportunity, SpendAggregate};
