/// Quartile points reported by descriptive summaries and boxplots.
pub const QUARTILES: [f64; 3] = [25.0, 50.0, 75.0];

/// Computes a single percentile value from sorted data.
///
/// This function interpolates linearly between the two closest ranks.
/// For a dataset with n values, the k-th percentile sits at fractional
/// position `(n - 1) * k / 100`.
///
/// # Arguments
///
/// * `sorted_values` - Values sorted in ascending order
/// * `percentile` - The percentile to compute (0.0 to 100.0)
///
/// # Returns
///
/// The value at the specified percentile. Returns `f64::NAN` if the input is empty.
///
/// # Examples
///
/// ```
/// use perfstat_stats::percentiles::compute_percentile;
///
/// let values = [1.0, 2.0, 3.0, 4.0];
///
/// assert_eq!(compute_percentile(&values, 50.0), 2.5);
/// assert_eq!(compute_percentile(&values, 25.0), 1.75);
/// assert_eq!(compute_percentile(&values, 100.0), 4.0);
/// ```
#[expect(
    clippy::cast_sign_loss,
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss
)]
#[must_use]
pub fn compute_percentile(sorted_values: &[f64], percentile: f64) -> f64 {
    debug_assert!(
        sorted_values.is_sorted_by(|a, b| a <= b),
        "values must be sorted in ascending order"
    );
    if sorted_values.is_empty() {
        return f64::NAN;
    }
    let last = sorted_values.len() - 1;
    let position = (last as f64 * percentile.clamp(0.0, 100.0)) / 100.0;
    let lower = (position.floor() as usize).min(last);
    let upper = (lower + 1).min(last);
    let fraction = position - lower as f64;
    let low = sorted_values[lower];
    let high = sorted_values[upper];
    low + (high - low) * fraction
}
