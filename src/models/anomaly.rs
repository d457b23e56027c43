use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnomalyKind {
    #[serde(rename = "QUANTITY_ANOMALY")]
    Quantity,
    #[serde(rename = "AMOUNT_ANOMALY")]
    Amount,
    #[serde(rename = "BOTH")]
    Both,
}

/// A historical order whose quantity or amount deviates from its purchase
/// pattern by more than the configured number of standard deviations.
///
/// Derived fresh from a pattern and cached with a TTL; never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderAnomaly {
    pub invoice_id: Uuid,
    pub invoice_date: NaiveDate,
    pub quantity: f64,
    pub amount: f64,
    pub expected_quantity: f64,
    pub expected_amount: f64,
    pub quantity_deviation: f64,
    pub amount_deviation: f64,
    pub kind: AnomalyKind,
}

impl OrderAnomaly {
    /// The larger of the two deviations, carried on the published event.
    pub fn max_deviation(&self) -> f64 {
        self.quantity_deviation.max(self.amount_deviation)
    }
}
