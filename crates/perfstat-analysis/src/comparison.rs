//! ANOVA and Kruskal-Wallis comparisons of one metric across implementations.

use std::fmt::Write as _;

use perfstat_stats::{
    comparison::{kruskal_wallis, one_way_anova},
    outcome::TestOutcome,
};
use serde::Serialize;

use crate::dataset::EndpointSlice;

/// Values of one metric, grouped by implementation.
///
/// Groups without any value for the metric are left out.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricGroups<'a> {
    pub metric: &'a str,
    pub implementations: Vec<&'a str>,
    pub values: Vec<Vec<f64>>,
}

impl<'a> MetricGroups<'a> {
    /// Collects the values of the numeric column at `column` for every implementation.
    #[must_use]
    pub fn collect(slice: &EndpointSlice<'a>, metric: &'a str, column: usize) -> Self {
        let mut implementations = vec![];
        let mut values = vec![];
        for group in slice.groups() {
            let group_values = group.values(column);
            if group_values.is_empty() {
                tracing::warn!(
                    endpoint = slice.name(),
                    implementation = group.implementation(),
                    metric,
                    "dropping implementation without values"
                );
                continue;
            }
            implementations.push(group.implementation());
            values.push(group_values);
        }
        Self {
            metric,
            implementations,
            values,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Parametric and non-parametric comparison results for one metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricComparison {
    pub metric: String,
    pub anova: TestOutcome,
    pub kruskal_wallis: TestOutcome,
}

impl MetricComparison {
    /// Runs one-way ANOVA and Kruskal-Wallis over `groups`.
    #[must_use]
    pub fn test(groups: &MetricGroups<'_>) -> Self {
        let anova = one_way_anova(&groups.values);
        let kruskal_wallis = kruskal_wallis(&groups.values);
        for (name, outcome) in [("anova", &anova), ("kruskal_wallis", &kruskal_wallis)] {
            if let Some(marker) = outcome.marker() {
                tracing::debug!(metric = groups.metric, test = name, "{marker}");
            }
        }
        Self {
            metric: groups.metric.to_owned(),
            anova,
            kruskal_wallis,
        }
    }

    /// Returns `true` if either test is computed with `p < alpha`.
    #[must_use]
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.anova.is_significant(alpha) || self.kruskal_wallis.is_significant(alpha)
    }

    #[must_use]
    pub fn render(&self) -> String {
        let mut out = format!("{}:\n", self.metric);
        for (label, symbol, outcome) in [
            ("ANOVA", "F", &self.anova),
            ("Kruskal-Wallis", "H", &self.kruskal_wallis),
        ] {
            let _ = match outcome.computed() {
                Some(result) => writeln!(
                    out,
                    "  {label} result: {symbol}-statistic = {}, p-value = {}",
                    result.statistic, result.p_value
                ),
                None => writeln!(out, "  {label} result: {outcome}"),
            };
        }
        out
    }
}
