//! Simple Moving Average (SMA).

/// Calculate Simple Moving Average.
///
/// # Arguments
///
/// * `data` - Price series
/// * `period` - Lookback period
///
/// # Returns
///
/// One value per input. The first `period - 1` entries are `None`, as is
/// every entry when `period` is 0 or longer than the series.
///
/// # Example
///
/// ```rust
/// use athena_core::indicators::sma;
///
/// let prices = vec![10.0, 11.0, 12.0, 11.0, 10.0];
/// let sma_values = sma(&prices, 3);
///
/// assert_eq!(sma_values[1], None);
/// // SMA at index 2 = (10 + 11 + 12) / 3 = 11.0
/// assert!((sma_values[2].unwrap() - 11.0).abs() < 0.001);
/// ```
pub fn sma(data: &[f64], period: usize) -> Vec<Option<f64>> {
    let n = data.len();
    let mut result = vec![None; n];

    if period == 0 || period > n {
        return result;
    }

    // Each window summed directly, no running sum
    for (i, window) in data.windows(period).enumerate() {
        result[i + period - 1] = Some(window.iter().sum::<f64>() / period as f64);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sma_basic() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma(&data, 3);

        assert_eq!(result[0], None);
        assert_eq!(result[1], None);

        // SMA[2] = (1 + 2 + 3) / 3 = 2.0
        assert!((result[2].unwrap() - 2.0).abs() < 0.001);

        // SMA[4] = (3 + 4 + 5) / 3 = 4.0
        assert!((result[4].unwrap() - 4.0).abs() < 0.001);
    }

    #[test]
    fn test_sma_period_1() {
        let data = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma(&data, 1);

        // Period 1 SMA should equal the data
        for (value, price) in result.iter().zip(&data) {
            assert_eq!(*value, Some(*price));
        }
    }

    #[test]
    fn test_sma_period_larger_than_data() {
        let result = sma(&[1.0, 2.0, 3.0], 10);
        assert_eq!(result, vec![None; 3]);
    }

    #[test]
    fn test_sma_zero_period() {
        assert!(sma(&[1.0, 2.0], 0).iter().all(Option::is_none));
        assert!(sma(&[], 3).is_empty());
    }
}
