//! Descriptive summary tables over a set of samples.

use std::fmt::{self, Write as _};

use perfstat_stats::descriptive::DescriptiveStats;
use serde::Serialize;

use crate::dataset::Sample;

const ROW_LABELS: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

/// Summary of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: String,
    /// `None` when the column has no values in the summarized set.
    pub stats: Option<DescriptiveStats>,
}

impl ColumnSummary {
    #[must_use]
    pub fn count(&self) -> usize {
        self.stats.as_ref().map_or(0, |s| s.count)
    }

    #[expect(clippy::cast_precision_loss)]
    fn row(&self) -> [Option<f64>; 8] {
        let count = Some(self.count() as f64);
        match &self.stats {
            Some(s) => [
                count,
                Some(s.mean),
                s.std_dev,
                Some(s.min),
                Some(s.q1),
                Some(s.median),
                Some(s.q3),
                Some(s.max),
            ],
            None => [count, None, None, None, None, None, None, None],
        }
    }
}

/// Count, mean, std, min, quartiles and max for every numeric column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveTable {
    pub columns: Vec<ColumnSummary>,
}

impl DescriptiveTable {
    /// Summarizes `samples` over every column in `columns`.
    ///
    /// Missing values are skipped per column.
    ///
    /// # Examples
    ///
    /// ```
    /// use perfstat_analysis::{dataset::Sample, summary::DescriptiveTable};
    ///
    /// let sample = |v| Sample {
    ///     endpoint_name: "list".into(),
    ///     implementation: "a".into(),
    ///     values: vec![Some(v)],
    /// };
    /// let samples = [sample(1.0), sample(2.0), sample(3.0)];
    /// let refs = samples.iter().collect::<Vec<_>>();
    ///
    /// let table = DescriptiveTable::summarize(&["latency".to_owned()], &refs);
    /// assert_eq!(table.column("latency").unwrap().count(), 3);
    /// ```
    #[must_use]
    pub fn summarize(columns: &[String], samples: &[&Sample]) -> Self {
        let columns = columns
            .iter()
            .enumerate()
            .map(|(index, column)| ColumnSummary {
                column: column.clone(),
                stats: DescriptiveStats::new(samples.iter().filter_map(|s| s.value(index))),
            })
            .collect();
        Self { columns }
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ColumnSummary> {
        self.columns.iter().find(|c| c.column == name)
    }

    /// Renders the table with one column per summarized column and one row per statistic.
    ///
    /// Values use six decimals; undefined statistics print as `NaN`.
    #[must_use]
    pub fn render(&self) -> String {
        let cells = self
            .columns
            .iter()
            .map(|c| c.row().map(|v| v.map_or_else(|| "NaN".to_owned(), |v| format!("{v:.6}"))))
            .collect::<Vec<_>>();
        let widths = self
            .columns
            .iter()
            .zip(&cells)
            .map(|(c, row)| {
                row.iter()
                    .map(String::len)
                    .chain([c.column.len()])
                    .max()
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>();
        let label_width = ROW_LABELS.iter().map(|l| l.len()).max().unwrap_or_default();

        let mut out = String::new();
        out.push_str(&" ".repeat(label_width));
        for (c, width) in self.columns.iter().zip(&widths) {
            let _ = write!(out, "  {:>width$}", c.column);
        }
        for (i, label) in ROW_LABELS.iter().enumerate() {
            out.push('\n');
            let _ = write!(out, "{label:<label_width$}");
            for (row, width) in cells.iter().zip(&widths) {
                let _ = write!(out, "  {:>width$}", row[i]);
            }
        }
        out
    }
}

impl fmt::Display for DescriptiveTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(values: &[Option<f64>]) -> Vec<Sample> {
        values
            .iter()
            .map(|v| Sample {
                endpoint_name: "e".into(),
                implementation: "a".into(),
                values: vec![*v],
            })
            .collect()
    }

    #[test]
    fn test_render_layout() {
        let owned = samples(&[Some(1.0), Some(2.0), Some(3.0), Some(4.0)]);
        let refs = owned.iter().collect::<Vec<_>>();
        let table = DescriptiveTable::summarize(&["ms".to_owned()], &refs);
        let expected = [
            "             ms",
            "count  4.000000",
            "mean   2.500000",
            "std    1.290994",
            "min    1.000000",
            "25%    1.750000",
            "50%    2.500000",
            "75%    3.250000",
            "max    4.000000",
        ]
        .join("\n");
        assert_eq!(table.render(), expected);
    }

    #[test]
    fn test_single_value_has_undefined_std() {
        let owned = samples(&[Some(5.0), None]);
        let refs = owned.iter().collect::<Vec<_>>();
        let table = DescriptiveTable::summarize(&["ms".to_owned()], &refs);
        let summary = table.column("ms").unwrap();
        assert_eq!(summary.count(), 1);
        assert!(table.render().contains(&format!("std{}NaN", " ".repeat(9))));
    }

    #[test]
    fn test_no_values() {
        let owned = samples(&[None, None]);
        let refs = owned.iter().collect::<Vec<_>>();
        let table = DescriptiveTable::summarize(&["ms".to_owned()], &refs);
        assert_eq!(table.column("ms").unwrap().count(), 0);
        let rendered = table.render();
        assert!(rendered.contains("count  0.000000"));
        assert!(rendered.contains(&format!("max{}NaN", " ".repeat(9))));
    }
}
