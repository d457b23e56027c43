use std::collections::BTreeMap;

use chrono::Datelike;

use crate::models::OrderObservation;
use crate::stats;

/// Detects monthly periodicity in order amounts.
///
/// Orders are grouped by calendar month (0-11, year-agnostic) and the
/// coefficient of variation across the per-month average amounts is compared
/// against `cv_threshold_pct`. Requires at least 12 orders spread over at
/// least 4 distinct months; otherwise the history is treated as non-seasonal.
///
/// Returns the month-to-average map when seasonal, `None` otherwise.
pub fn detect_seasonality(
    orders: &[OrderObservation],
    cv_threshold_pct: f64,
) -> Option<BTreeMap<u32, f64>> {
    if orders.len() < 12 {
        return None;
    }

    let mut by_month: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for order in orders {
        by_month.entry(order.date.month0()).or_default().push(order.amount);
    }
    if by_month.len() < 4 {
        return None;
    }

    let monthly_averages: BTreeMap<u32, f64> = by_month
        .into_iter()
        .map(|(month, amounts)| (month, stats::mean(&amounts)))
        .collect();

    let averages: Vec<f64> = monthly_averages.values().copied().collect();
    if stats::coefficient_of_variation(&averages) > cv_threshold_pct {
        Some(monthly_averages)
    } else {
        None
    }
}
