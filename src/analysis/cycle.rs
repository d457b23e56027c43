use crate::models::order::{sorted_by_date, OrderObservation};
use crate::stats;

/// Day-deltas between consecutive orders, ascending by date.
pub fn cycle_intervals(orders: &[OrderObservation]) -> Vec<f64> {
    if orders.len() < 2 {
        return Vec::new();
    }
    let sorted = sorted_by_date(orders);
    sorted
        .windows(2)
        .map(|pair| (pair[1].date - pair[0].date).num_days() as f64)
        .collect()
}

/// Average reorder interval in days. Requires at least two orders, else `0.0`.
///
/// Robust to irregular but roughly periodic ordering; no minimum regularity
/// is required.
pub fn average_cycle_days(orders: &[OrderObservation]) -> f64 {
    stats::mean(&cycle_intervals(orders))
}
