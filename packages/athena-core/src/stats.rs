//! Descriptive statistics shared by the metric modules.
//!
//! Variance and covariance use the sample (n - 1) denominator.

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample variance, `None` with fewer than two observations.
pub fn sample_variance(values: &[f64]) -> Option<f64> {
    sample_covariance(values, values)
}

/// Sample standard deviation, `None` with fewer than two observations.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    sample_variance(values).map(f64::sqrt)
}

/// Sample covariance of two equally long slices.
///
/// Returns `None` when the lengths differ or fewer than two pairs exist.
pub fn sample_covariance(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let mean_x = mean(x)?;
    let mean_y = mean(y)?;
    let sum: f64 = x
        .iter()
        .zip(y)
        .map(|(a, b)| (a - mean_x) * (b - mean_y))
        .sum();

    Some(sum / (x.len() - 1) as f64)
}

/// Empirical percentile with linear interpolation between order statistics.
///
/// `pct` is in `[0, 100]`. Non-finite values are ignored.
pub fn percentile(values: &[f64], pct: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() || !(0.0..=100.0).contains(&pct) {
        return None;
    }
    sorted.sort_by(f64::total_cmp);

    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Simple period-over-period returns.
///
/// The output has the same length as the input; the first element is 0.0, as
/// is any element whose previous value is zero.
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    let mut returns = Vec::with_capacity(values.len());
    if values.is_empty() {
        return returns;
    }

    returns.push(0.0);
    for w in values.windows(2) {
        if w[0] != 0.0 {
            returns.push(w[1] / w[0] - 1.0);
        } else {
            returns.push(0.0);
        }
    }

    returns
}

/// Running product of `(1 + r)`.
pub fn cumulative_growth(returns: &[f64]) -> Vec<f64> {
    returns
        .iter()
        .scan(1.0, |acc, r| {
            *acc *= 1.0 + r;
            Some(*acc)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
    }

    #[test]
    fn test_sample_variance() {
        // Deviations -2, 0, 2 -> 8 / 2
        assert_eq!(sample_variance(&[1.0, 3.0, 5.0]), Some(4.0));
        assert_eq!(sample_std(&[1.0, 3.0, 5.0]), Some(2.0));
        assert_eq!(sample_variance(&[1.0]), None);
    }

    #[test]
    fn test_sample_covariance() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        let cov = sample_covariance(&x, &y).unwrap();
        assert_abs_diff_eq!(cov, 2.0 * sample_variance(&x).unwrap(), epsilon = 1e-12);
        assert_eq!(sample_covariance(&x, &y[..3]), None);
    }

    #[test]
    fn test_percentile_interpolates() {
        let values = [0.06, -0.05, 0.02, -0.03, 0.0, 0.04, -0.01];
        // rank = 0.05 * 6 = 0.3 -> -0.05 + 0.3 * 0.02
        assert_abs_diff_eq!(percentile(&values, 5.0).unwrap(), -0.044, epsilon = 1e-12);
        assert_eq!(percentile(&values, 0.0), Some(-0.05));
        assert_eq!(percentile(&values, 100.0), Some(0.06));
        assert_eq!(percentile(&values, 50.0), Some(0.0));
        assert_eq!(percentile(&[], 5.0), None);
        assert_eq!(percentile(&values, 101.0), None);
    }

    #[test]
    fn test_pct_change_first_is_zero() {
        let returns = pct_change(&[100.0, 110.0, 99.0]);
        assert_eq!(returns[0], 0.0);
        assert_abs_diff_eq!(returns[1], 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(returns[2], -0.1, epsilon = 1e-12);
        assert!(pct_change(&[]).is_empty());
    }

    #[test]
    fn test_pct_change_zero_base() {
        assert_eq!(pct_change(&[0.0, 5.0]), vec![0.0, 0.0]);
    }

    #[test]
    fn test_cumulative_growth() {
        let growth = cumulative_growth(&[0.0, 0.1, -0.5]);
        assert_abs_diff_eq!(growth[0], 1.0);
        assert_abs_diff_eq!(growth[1], 1.1, epsilon = 1e-12);
        assert_abs_diff_eq!(growth[2], 0.55, epsilon = 1e-12);
    }
}
