//! Numeric helpers shared by the metrics and the rate report.
//!
//! Sums are always taken sequentially in slice order, so a value computed
//! in parallel and collected into a buffer reduces to the same bits on
//! every run.

use num_traits::Float;

/// Sum of `values` in slice order.
pub fn ordered_sum<T: Float>(values: &[T]) -> T {
    values.iter().fold(T::zero(), |acc, &v| acc + v)
}

/// Arithmetic mean, `None` for an empty slice.
///
/// # Examples
/// ```
/// use tvmc_core::math_utils::mean;
/// assert_eq!(mean(&[1.0f64, 2.0, 3.0]), Some(2.0));
/// assert_eq!(mean::<f64>(&[]), None);
/// ```
pub fn mean<T: Float>(values: &[T]) -> Option<T> {
    if values.is_empty() {
        return None;
    }
    let n = T::from(values.len())?;
    Some(ordered_sum(values) / n)
}

/// Peak signal-to-noise ratio in dB: `20·log10(peak) − 10·log10(mse)`.
///
/// A zero error has no finite ratio and is reported as `+∞` explicitly
/// rather than through a division by zero.
///
/// # Examples
/// ```
/// use tvmc_core::math_utils::psnr;
/// assert_eq!(psnr(10.0f64, 0.0), f64::INFINITY);
/// assert!((psnr(10.0f64, 1.0) - 20.0).abs() < 1e-12);
/// ```
pub fn psnr<T: Float>(peak: T, mse: T) -> T {
    if mse == T::zero() {
        return T::infinity();
    }
    let ten = T::from(10.0).unwrap_or_else(T::one);
    let twenty = ten + ten;
    twenty * peak.log10() - ten * mse.log10()
}

/// Largest value, ignoring NaN. `None` for an empty slice.
pub fn max_value<T: Float>(values: &[T]) -> Option<T> {
    values.iter().copied().reduce(T::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_sum_is_left_fold() {
        let values = [1e16f64, 1.0, -1e16, 1.0];
        assert_eq!(ordered_sum(&values), ((1e16 + 1.0) - 1e16) + 1.0);
    }

    #[test]
    fn test_psnr_monotonic_in_error() {
        assert!(psnr(1.0f64, 1e-4) > psnr(1.0f64, 1e-3));
    }

    #[test]
    fn test_max_value() {
        assert_eq!(max_value(&[1.0f64, 5.0, 3.0]), Some(5.0));
        assert_eq!(max_value::<f64>(&[]), None);
    }
}
