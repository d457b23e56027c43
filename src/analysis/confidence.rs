use chrono::NaiveDate;

use crate::analysis::cycle;
use crate::models::order::{sorted_by_date, OrderObservation};
use crate::stats;

/// Heuristic confidence score in `[0, 1]` for a computed purchase pattern.
///
/// Sum of three capped factors: sample size (max 0.4), cycle consistency
/// (max 0.4) and recency (max 0.2). This is a heuristic, not a statistically
/// derived posterior.
pub fn score(
    orders: &[OrderObservation],
    min_required_invoices: u32,
    avg_cycle_days: f64,
    recency_horizon_days: i64,
    as_of: NaiveDate,
) -> f64 {
    let sample_factor =
        (orders.len() as f64 / (min_required_invoices as f64 * 4.0)).min(1.0) * 0.4;

    // More regular cycles raise confidence; an undetermined cycle scores
    // the neutral default.
    let cycle_factor = if avg_cycle_days == 0.0 || orders.len() < 2 {
        0.2
    } else {
        let intervals = cycle::cycle_intervals(orders);
        let cv = stats::safe_div(stats::std_dev(&intervals), stats::mean(&intervals));
        (0.4 - cv * 0.2).max(0.0)
    };

    // Linear decay to zero over the recency horizon since the last order.
    let recency_factor = match sorted_by_date(orders).last() {
        Some(last) => {
            let days_since = (as_of - last.date).num_days() as f64;
            (0.2 * (1.0 - days_since / recency_horizon_days as f64)).max(0.0)
        }
        None => 0.0,
    };

    (sample_factor + cycle_factor + recency_factor).min(1.0)
}
