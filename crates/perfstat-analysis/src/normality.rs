//! Per-implementation Shapiro-Wilk tests.

use std::fmt::Write as _;

use perfstat_stats::{normality::shapiro_wilk, outcome::TestOutcome};
use serde::Serialize;

use crate::dataset::EndpointSlice;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupNormality {
    pub implementation: String,
    pub outcome: TestOutcome,
}

/// Normality of one metric within every implementation of an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricNormality {
    pub metric: String,
    pub groups: Vec<GroupNormality>,
}

impl MetricNormality {
    /// Tests each implementation group of `slice` on the numeric column at `column`.
    ///
    /// Every group is reported, including those too small to test.
    #[must_use]
    pub fn test(slice: &EndpointSlice<'_>, metric: &str, column: usize) -> Self {
        let groups = slice
            .groups()
            .into_iter()
            .map(|group| {
                let outcome = shapiro_wilk(&group.values(column));
                if let Some(marker) = outcome.marker() {
                    tracing::debug!(
                        endpoint = slice.name(),
                        implementation = group.implementation(),
                        metric,
                        "shapiro-wilk {marker}"
                    );
                }
                GroupNormality {
                    implementation: group.implementation().to_owned(),
                    outcome,
                }
            })
            .collect();
        Self {
            metric: metric.to_owned(),
            groups,
        }
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!("Normality tests for {}:\n", self.metric);
        for group in &self.groups {
            let _ = match group.outcome.computed() {
                Some(result) => writeln!(
                    out,
                    "  Implementation: {}, W = {}, p-value: {}",
                    group.implementation, result.statistic, result.p_value
                ),
                None => writeln!(
                    out,
                    "  Implementation: {}, {}",
                    group.implementation, group.outcome
                ),
            };
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use perfstat_stats::outcome::Outcome;

    use super::*;
    use crate::dataset::{Dataset, Sample};

    #[test]
    fn test_one_sample_group_is_insufficient() {
        let rows = [("a", 10.0), ("a", 12.0), ("a", 11.0), ("a", 15.0), ("b", 30.0)];
        let samples = rows
            .iter()
            .map(|(implementation, value)| Sample {
                endpoint_name: "list".into(),
                implementation: (*implementation).into(),
                values: vec![Some(*value)],
            })
            .collect();
        let dataset = Dataset::from_samples(vec!["ms".into()], samples);
        let normality = MetricNormality::test(&dataset.endpoints()[0], "ms", 0);

        assert_eq!(normality.groups.len(), 2);
        assert!(normality.groups[0].outcome.is_computed());
        assert_eq!(
            normality.groups[1].outcome,
            Outcome::InsufficientData {
                required: 3,
                actual: 1
            }
        );

        let rendered = normality.render();
        assert!(rendered.starts_with("Normality tests for ms:\n  Implementation: a, W = "));
        assert!(rendered.ends_with(
            "  Implementation: b, insufficient data (1 value, at least 3 required)\n"
        ));
    }
}
