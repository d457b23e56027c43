use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recorded price for an item at a vendor/branch on a given date.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceSnapshot {
    pub branch_id: Uuid,
    pub branch_name: String,
    pub vendor_id: Uuid,
    pub vendor_name: String,
    pub price: f64,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BranchPrice {
    pub branch_id: Uuid,
    pub branch_name: String,
    pub price: f64,
    /// Percentage deviation from the vendor's network average price.
    pub deviation_from_average_pct: f64,
}

/// Cross-branch price comparison for one item at one vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceVarianceReport {
    pub item_id: Uuid,
    pub vendor_id: Uuid,
    pub vendor_name: String,
    pub branches: Vec<BranchPrice>,
    pub network_avg_price: f64,
    pub network_min_price: f64,
    pub network_max_price: f64,
    /// Maximum absolute per-branch deviation, percent.
    pub max_variance_pct: f64,
}

/// Network-wide price statistics for one item, across all vendors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BenchmarkStats {
    pub item_id: Uuid,
    pub avg_price: f64,
    pub min_price: f64,
    pub max_price: f64,
    pub price_range: f64,
    pub branch_count: usize,
}
