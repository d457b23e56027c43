use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Persisted statistical summary of how an item is reordered for a given
/// item/branch pair. One row per unique `(item_id, branch_id)`; recomputation
/// upserts by that natural key and never duplicates. `branch_id = None` means
/// the network-wide pattern across all branches.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchasePattern {
    pub id: Uuid,
    pub item_id: Uuid,
    pub branch_id: Option<Uuid>,
    pub avg_order_cycle_days: f64,
    pub avg_order_quantity: f64,
    pub avg_order_amount: f64,
    pub std_dev_quantity: f64,
    pub std_dev_amount: f64,
    pub is_increasing: bool,
    pub is_decreasing: bool,
    pub is_seasonal: bool,
    /// Calendar month (0-11) to average order amount; present only when
    /// the history is seasonal. Serialized to JSONB at the persistence edge.
    pub seasonality: Option<BTreeMap<u32, f64>>,
    pub last_order_date: Option<NaiveDate>,
    pub next_predicted_order: Option<NaiveDate>,
    pub confidence_score: f64,
    pub based_on_invoices: i64,
    pub analysis_start: NaiveDate,
    pub analysis_end: NaiveDate,
    pub computed_at: DateTime<Utc>,
}

/// Outcome of a pattern analysis. Too little history is a legitimate
/// business result, distinct from an infrastructure error.
#[derive(Debug, Clone)]
pub enum PatternOutcome {
    Found(PurchasePattern),
    InsufficientData,
}

impl PatternOutcome {
    pub fn into_pattern(self) -> Option<PurchasePattern> {
        match self {
            Self::Found(pattern) => Some(pattern),
            Self::InsufficientData => None,
        }
    }
}
