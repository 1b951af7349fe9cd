//! Statistics utilities
//!
//! Pure functions shared by the readiness scorer, fatigue tracker and
//! recovery summary. Degenerate inputs produce defined zero values rather
//! than errors or NaN.

use statrs::statistics::Statistics;

/// Mean and population standard deviation
///
/// Returns `(0.0, 0.0)` for an empty slice; callers that need a real
/// baseline must check the length themselves.
pub fn mean_and_population_std_dev(values: &[f64]) -> (f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0);
    }
    let mean = Statistics::mean(values.iter());
    let sd = Statistics::population_std_dev(values.iter());
    (mean, sd)
}

/// Population variance, 0 for an empty slice
pub fn population_variance(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    Statistics::population_variance(values.iter())
}

/// Standard score of `value`; 0 when the spread is zero
pub fn z_score(value: f64, mean: f64, sd: f64) -> f64 {
    if sd == 0.0 || !sd.is_finite() {
        return 0.0;
    }
    (value - mean) / sd
}

/// Ordinary least squares slope of `series` against its index
///
/// `None` with fewer than two points.
pub fn linear_trend_slope(series: &[f64]) -> Option<f64> {
    if series.len() < 2 {
        return None;
    }

    let n = series.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = series.iter().sum::<f64>() / n;

    let mut covariance = 0.0;
    let mut x_variance = 0.0;
    for (i, y) in series.iter().enumerate() {
        let dx = i as f64 - x_mean;
        covariance += dx * (y - y_mean);
        x_variance += dx * dx;
    }

    if x_variance == 0.0 {
        return None;
    }
    Some(covariance / x_variance)
}

/// Whether the least squares trend of `series` is strictly rising
pub fn linear_trend_slope_sign(series: &[f64]) -> bool {
    linear_trend_slope(series).is_some_and(|slope| slope > 0.0)
}

/// Exponentially weighted moving average seeded with the first value
///
/// `ewma_t = ewma_{t-1} + alpha * (x_t - ewma_{t-1})`. Returns 0 for an
/// empty series.
pub fn exponential_moving_average(series: &[f64], alpha: f64) -> f64 {
    let mut iter = series.iter();
    let Some(first) = iter.next() else {
        return 0.0;
    };
    iter.fold(*first, |ewma, value| ewma + alpha * (value - ewma))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_mean_and_sd() {
        let (mean, sd) = mean_and_population_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((mean - 5.0).abs() < 1e-9);
        assert!((sd - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_mean_and_sd_empty_is_degenerate() {
        assert_eq!(mean_and_population_std_dev(&[]), (0.0, 0.0));
        assert_eq!(population_variance(&[]), 0.0);
    }

    #[test]
    fn test_population_variance() {
        assert!((population_variance(&[10.0, 10.0, 10.0])).abs() < 1e-12);
        assert!((population_variance(&[1.0, 3.0]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_z_score_zero_sd() {
        assert_eq!(z_score(75.0, 50.0, 0.0), 0.0);
        assert!((z_score(40.0, 50.0, 5.0) + 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_trend_slope() {
        assert!((linear_trend_slope(&[1.0, 2.0, 3.0, 4.0]).unwrap() - 1.0).abs() < 1e-12);
        assert!(linear_trend_slope_sign(&[50.0, 51.0, 53.0]));
        assert!(!linear_trend_slope_sign(&[53.0, 51.0, 50.0]));
        assert!(!linear_trend_slope_sign(&[50.0, 50.0, 50.0]));
    }

    #[test]
    fn test_trend_needs_two_points() {
        assert_eq!(linear_trend_slope(&[]), None);
        assert_eq!(linear_trend_slope(&[42.0]), None);
        assert!(!linear_trend_slope_sign(&[42.0]));
    }

    #[test]
    fn test_ewma() {
        assert_eq!(exponential_moving_average(&[], 0.3), 0.0);
        assert_eq!(exponential_moving_average(&[100.0], 0.3), 100.0);
        // 0 -> 0 + 0.5 * (10 - 0) = 5
        assert!((exponential_moving_average(&[0.0, 10.0], 0.5) - 5.0).abs() < 1e-12);
    }

    proptest! {
        #[test]
        fn test_z_score_never_nan_for_zero_sd(value in -1e6f64..1e6, mean in -1e6f64..1e6) {
            prop_assert_eq!(z_score(value, mean, 0.0), 0.0);
        }

        #[test]
        fn test_constant_series_has_zero_spread(value in 0.0f64..500.0, len in 1usize..30) {
            let series = vec![value; len];
            let (mean, sd) = mean_and_population_std_dev(&series);
            prop_assert!((mean - value).abs() < 1e-6);
            prop_assert!(sd.abs() < 1e-6);
        }
    }
}
