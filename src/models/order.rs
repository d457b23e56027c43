use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One finalized purchase of an item, derived from invoice line items.
///
/// Ephemeral input to the analyzers; never persisted by this engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderObservation {
    pub invoice_id: Uuid,
    pub date: NaiveDate,
    pub quantity: f64,
    pub price: f64,
    pub amount: f64,
}

impl OrderObservation {
    pub fn new(invoice_id: Uuid, date: NaiveDate, quantity: f64, price: f64) -> Self {
        Self {
            invoice_id,
            date,
            quantity,
            price,
            amount: quantity * price,
        }
    }
}

/// Returns the observations sorted ascending by order date.
pub fn sorted_by_date(orders: &[OrderObservation]) -> Vec<OrderObservation> {
    let mut sorted = orders.to_vec();
    sorted.sort_by_key(|o| o.date);
    sorted
}
