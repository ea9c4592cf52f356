//! Dunn post-hoc analysis, run only after a significant comparison.

use std::fmt::Write as _;

use perfstat_stats::{
    outcome::Outcome,
    posthoc::{Correction, PairwiseMatrix, dunn},
};
use serde::Serialize;

use crate::comparison::{MetricComparison, MetricGroups};

/// Why post-hoc analysis was not attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Neither omnibus test reached significance.
    NotSignificant,
    /// Fewer than two implementation groups to compare.
    NotApplicable,
}

/// Adjusted pairwise p-values labelled by implementation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairwiseTable {
    pub implementations: Vec<String>,
    pub matrix: PairwiseMatrix,
}

impl PairwiseTable {
    /// Adjusted p-value between two implementations, by label.
    #[must_use]
    pub fn p_value(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.implementations.iter().position(|l| l == a)?;
        let j = self.implementations.iter().position(|l| l == b)?;
        Some(self.matrix.get(i, j))
    }

    /// Renders the matrix with implementation labels on both axes.
    #[must_use]
    pub fn render(&self) -> String {
        let cells = self
            .matrix
            .rows()
            .map(|row| row.iter().map(|p| format_p_value(*p)).collect::<Vec<_>>())
            .collect::<Vec<_>>();
        let label_width = self
            .implementations
            .iter()
            .map(String::len)
            .max()
            .unwrap_or_default();
        let widths = self
            .implementations
            .iter()
            .enumerate()
            .map(|(j, label)| {
                cells
                    .iter()
                    .map(|row| row[j].len())
                    .chain([label.len()])
                    .max()
                    .unwrap_or_default()
            })
            .collect::<Vec<_>>();

        let mut out = " ".repeat(label_width);
        for (label, width) in self.implementations.iter().zip(&widths) {
            let _ = write!(out, "  {label:>width$}");
        }
        for (label, row) in self.implementations.iter().zip(&cells) {
            let _ = write!(out, "\n{label:<label_width$}");
            for (cell, width) in row.iter().zip(&widths) {
                let _ = write!(out, "  {cell:>width$}");
            }
        }
        out
    }
}

fn format_p_value(p: f64) -> String {
    if p != 0.0 && p < 1e-4 {
        format!("{p:.6e}")
    } else {
        format!("{p:.6}")
    }
}

/// Result of the post-hoc step for one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "posthoc", rename_all = "snake_case")]
pub enum PosthocOutcome {
    Skipped { reason: SkipReason },
    Performed(Outcome<PairwiseTable>),
}

impl PosthocOutcome {
    /// Runs Dunn's test with Bonferroni correction when `comparison` is significant at `alpha`.
    ///
    /// # Arguments
    ///
    /// * `groups` - The groups `comparison` was computed from
    /// * `comparison` - ANOVA and Kruskal-Wallis results gating the analysis
    /// * `alpha` - Significance level
    #[must_use]
    pub fn analyze(groups: &MetricGroups<'_>, comparison: &MetricComparison, alpha: f64) -> Self {
        if groups.len() < 2 {
            return Self::Skipped {
                reason: SkipReason::NotApplicable,
            };
        }
        if !comparison.is_significant(alpha) {
            tracing::debug!(metric = groups.metric, "no significant difference");
            return Self::Skipped {
                reason: SkipReason::NotSignificant,
            };
        }
        let outcome = dunn(&groups.values, Correction::Bonferroni).map(|matrix| PairwiseTable {
            implementations: groups
                .implementations
                .iter()
                .map(|&s| s.to_owned())
                .collect(),
            matrix,
        });
        Self::Performed(outcome)
    }

    #[must_use]
    pub fn table(&self) -> Option<&PairwiseTable> {
        match self {
            Self::Performed(outcome) => outcome.computed(),
            Self::Skipped { .. } => None,
        }
    }

    /// Section body for `metric`.
    #[must_use]
    pub fn render(&self, metric: &str) -> String {
        match self {
            Self::Skipped {
                reason: SkipReason::NotSignificant,
            } => format!(
                "{metric}: ANOVA and Kruskal-Wallis tests did not show significant differences, skipping post-hoc analysis.\n"
            ),
            Self::Skipped {
                reason: SkipReason::NotApplicable,
            } => format!(
                "{metric}: fewer than 2 implementation groups, skipping post-hoc analysis.\n"
            ),
            Self::Performed(Outcome::Computed(table)) => table.render(),
            Self::Performed(outcome) => {
                let marker = outcome.marker().unwrap_or_default();
                format!("{metric}: post-hoc analysis {marker}\n")
            }
        }
    }
}
