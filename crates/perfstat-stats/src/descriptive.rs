use serde::Serialize;

use crate::percentiles::{QUARTILES, compute_percentile};

/// Descriptive statistics summarizing a dataset.
///
/// This structure mirrors the classic `count / mean / std / min / quartiles / max`
/// summary of a column of `f64` values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStats {
    /// The number of values in the dataset.
    pub count: usize,
    /// The arithmetic mean (average) of the dataset.
    pub mean: f64,
    /// The sample standard deviation (`n - 1` denominator).
    ///
    /// `None` when the dataset holds a single value.
    pub std_dev: Option<f64>,
    /// The minimum value in the dataset.
    pub min: f64,
    /// The 25th percentile.
    pub q1: f64,
    /// The median value of the dataset.
    pub median: f64,
    /// The 75th percentile.
    pub q3: f64,
    /// The maximum value in the dataset.
    pub max: f64,
}

impl DescriptiveStats {
    /// Computes descriptive statistics from unsorted values.
    ///
    /// This method will sort the values internally before computing statistics.
    /// `NaN` values are discarded.
    ///
    /// # Arguments
    ///
    /// * `values` - An iterator over `f64` values. The values will be collected and sorted internally.
    ///
    /// # Returns
    ///
    /// * `Some(DescriptiveStats)` - if the dataset contains at least one value
    /// * `None` - if the dataset is empty
    ///
    /// # Examples
    ///
    /// ```
    /// # use perfstat_stats::descriptive::DescriptiveStats;
    /// let values = [5.0, 2.0, 4.0, 1.0, 3.0];
    /// let stats = DescriptiveStats::new(values).unwrap();
    /// assert_eq!(stats.count, 5);
    /// assert_eq!(stats.min, 1.0);
    /// assert_eq!(stats.max, 5.0);
    /// assert_eq!(stats.mean, 3.0);
    /// assert_eq!(stats.median, 3.0);
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values = values
            .into_iter()
            .filter(|v| !v.is_nan())
            .collect::<Vec<_>>();
        values.sort_by(f64::total_cmp);
        Self::from_sorted(&values)
    }

    /// Computes descriptive statistics from pre-sorted values.
    ///
    /// This is an optimized version that skips the sorting step.
    /// Use this when you already have sorted data to avoid unnecessary work.
    ///
    /// # Arguments
    ///
    /// * `sorted_values` - Values sorted in ascending order
    ///
    /// # Returns
    ///
    /// * `Some(DescriptiveStats)` - if the dataset contains at least one value
    /// * `None` - if the dataset is empty
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    ///
    /// # Examples
    ///
    /// ```
    /// # use perfstat_stats::descriptive::DescriptiveStats;
    /// let stats = DescriptiveStats::from_sorted(&[42.0]).unwrap();
    /// assert_eq!(stats.mean, 42.0);
    /// assert_eq!(stats.std_dev, None);
    /// ```
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let min = *sorted_values.first()?;
        let max = *sorted_values.last()?;
        let count = sorted_values.len();
        let n = count as f64;
        let mean = sorted_values.iter().sum::<f64>() / n;
        let std_dev = (count > 1).then(|| {
            let sum_sq = sorted_values
                .iter()
                .map(|v| (v - mean).powi(2))
                .sum::<f64>();
            (sum_sq / (n - 1.0)).sqrt()
        });
        let [q1, median, q3] = QUARTILES.map(|p| compute_percentile(sorted_values, p));

        Some(Self {
            count,
            mean,
            std_dev,
            min,
            q1,
            median,
            q3,
            max,
        })
    }

    /// Returns the interquartile range (`q3 - q1`).
    #[must_use]
    pub fn iqr(&self) -> f64 {
        self.q3 - self.q1
    }
}
