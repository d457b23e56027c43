use crate::models::order::{sorted_by_date, OrderObservation};
use crate::stats;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Trend {
    pub is_increasing: bool,
    pub is_decreasing: bool,
}

/// Classifies spend trend by comparing the average amount of the first third
/// of the order sequence against the last third.
///
/// Requires at least three orders and a non-empty third; `band_pct` is a dead
/// zone around stable — a last-third average within ±band of the first-third
/// average is neither increasing nor decreasing.
pub fn detect_trend(orders: &[OrderObservation], band_pct: f64) -> Trend {
    if orders.len() < 3 {
        return Trend::default();
    }
    let third = orders.len() / 3;
    if third == 0 {
        return Trend::default();
    }

    let sorted = sorted_by_date(orders);
    let first: Vec<f64> = sorted[..third].iter().map(|o| o.amount).collect();
    let last: Vec<f64> = sorted[sorted.len() - third..].iter().map(|o| o.amount).collect();

    let first_avg = stats::mean(&first);
    let last_avg = stats::mean(&last);
    let band = band_pct / 100.0;

    Trend {
        is_increasing: last_avg > first_avg * (1.0 + band),
        is_decreasing: last_avg < first_avg * (1.0 - band),
    }
}
