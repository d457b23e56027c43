use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Precomputed per-dimension spend rollup. Produced by an aggregation job
/// outside this engine; consumed read-only here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpendAggregate {
    pub date: NaiveDate,
    pub item_id: Uuid,
    pub item_name: String,
    pub vendor_id: Uuid,
    pub vendor_name: String,
    pub branch_id: Uuid,
    pub branch_name: String,
    pub total_amount: f64,
    pub invoice_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchSpending {
    pub branch_id: Uuid,
    pub branch_name: String,
    pub total_amount: f64,
    pub invoice_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidationBranch {
    pub branch_id: Uuid,
    pub branch_name: String,
    pub amount: f64,
    /// Set only when this branch used exactly one vendor for the item in
    /// the window; `None` signals ambiguity (multiple vendors at one branch).
    pub vendor_id: Option<Uuid>,
    pub vendor_name: Option<String>,
}

/// An item purchased from multiple vendors and/or at multiple branches,
/// signaling potential savings from standardizing on one vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsolidationOpportunity {
    pub item_id: Uuid,
    pub item_name: String,
    pub branch_count: usize,
    pub vendor_count: usize,
    pub total_spending: f64,
    pub branches: Vec<ConsolidationBranch>,
}
