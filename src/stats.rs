/// Statistics primitives shared by the pattern and cross-location services.
///
/// Every function degrades to `0.0` on empty or degenerate input instead of
/// producing NaN/Infinity or an error. Sparse histories are the norm in
/// procurement data, so silent degradation is the chosen trade-off here.

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divide by N).
///
/// Returns `0.0` for empty and single-element input. Understates variance
/// for small samples compared to the sample statistic; kept as-is so
/// anomaly thresholds stay comparable with historically computed patterns.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

pub fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return 0.0;
    }
    numerator / denominator
}

/// Coefficient of variation as a percentage (`std_dev / mean * 100`).
pub fn coefficient_of_variation(values: &[f64]) -> f64 {
    safe_div(std_dev(values), mean(values)) * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_empty() {
        assert_eq!(mean(&[]), 0.0);
    }

    #[test]
    fn test_mean_basic() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]), 2.0);
    }

    #[test]
    fn test_std_dev_empty_and_single() {
        assert_eq!(std_dev(&[]), 0.0);
        assert_eq!(std_dev(&[42.0]), 0.0);
    }

    #[test]
    fn test_std_dev_population() {
        // population stddev of [2, 4, 4, 4, 5, 5, 7, 9] is exactly 2
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((std_dev(&values) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_std_dev_never_negative() {
        let values = [-3.0, -1.0, 0.0, 100.0];
        assert!(std_dev(&values) >= 0.0);
    }

    #[test]
    fn test_safe_div_zero_denominator() {
        assert_eq!(safe_div(5.0, 0.0), 0.0);
        assert_eq!(safe_div(0.0, 0.0), 0.0);
        assert_eq!(safe_div(-7.5, 0.0), 0.0);
    }

    #[test]
    fn test_safe_div_normal() {
        assert_eq!(safe_div(10.0, 4.0), 2.5);
    }

    #[test]
    fn test_cv_constant_series_is_zero() {
        let values = [50.0, 50.0, 50.0, 50.0];
        assert_eq!(coefficient_of_variation(&values), 0.0);
    }
}
