//! Per-endpoint orchestration of the analysis steps.
//!
//! For every endpoint, in order:
//!
//! 1. Endpoint header
//! 2. Overall descriptive statistics
//! 3. Descriptive statistics per implementation
//! 4. Boxplots, one per metric
//! 5. Normality tests
//! 6. ANOVA and Kruskal-Wallis comparisons
//! 7. Post-hoc analysis, one section per metric
//!
//! Degenerate statistical input never aborts the run: it is reported in place
//! of the affected result. Only I/O failures stop the analysis.

use std::{io, path::PathBuf};

use serde::Serialize;

use crate::{
    comparison::{MetricComparison, MetricGroups},
    dataset::{Dataset, EndpointSlice},
    normality::MetricNormality,
    plot,
    posthoc::PosthocOutcome,
    report::Report,
    summary::DescriptiveTable,
};

/// Threshold below which a p-value is significant.
pub const SIGNIFICANCE_LEVEL: f64 = 0.05;

/// Choices for a single analysis run.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    /// Metric columns to test and plot.
    pub metrics: Vec<String>,
    /// Directory receiving boxplots; `None` disables plotting.
    pub plot_dir: Option<PathBuf>,
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum AnalysisError {
    #[display("metric '{metric}' is not a numeric column of the dataset")]
    UnknownMetric { metric: String },
    #[display("failed to write report section '{section}'")]
    Report { section: String, source: io::Error },
    #[display("failed to write boxplot for metric '{metric}'")]
    Plot { metric: String, source: io::Error },
}

impl AnalysisError {
    fn report(section: &str) -> impl FnOnce(io::Error) -> Self {
        let section = section.to_owned();
        move |source| Self::Report { section, source }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImplementationSummary {
    pub implementation: String,
    pub statistics: DescriptiveTable,
}

/// Every result computed for one metric of one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricAnalysis {
    pub metric: String,
    pub normality: MetricNormality,
    pub comparison: MetricComparison,
    pub posthoc: PosthocOutcome,
    pub plot: Option<PathBuf>,
}

/// Every result computed for one endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointAnalysis {
    pub endpoint: String,
    pub overall: DescriptiveTable,
    pub implementations: Vec<ImplementationSummary>,
    pub metrics: Vec<MetricAnalysis>,
}

/// Runs the analysis steps and appends their sections to the report.
#[derive(Debug)]
pub struct ReportAssembler<'a> {
    config: &'a AnalysisConfig,
}

impl<'a> ReportAssembler<'a> {
    #[must_use]
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config }
    }

    /// Analyzes every endpoint of `dataset`, in order of first appearance.
    ///
    /// `metrics` comes from [`ReportAssembler::resolve_metrics`]. The report is
    /// left open; call [`Report::finish`] to mark it complete.
    pub fn analyze_dataset(
        &self,
        dataset: &Dataset,
        metrics: &[(&str, usize)],
        report: &mut Report,
    ) -> Result<Vec<EndpointAnalysis>, AnalysisError> {
        dataset
            .endpoints()
            .iter()
            .map(|slice| self.analyze_endpoint(slice, metrics, report))
            .collect()
    }

    /// Looks up the configured metrics among the numeric columns of `dataset`.
    ///
    /// Call this before creating the report so that a bad metric list leaves
    /// no output behind.
    pub fn resolve_metrics(
        &self,
        dataset: &Dataset,
    ) -> Result<Vec<(&'a str, usize)>, AnalysisError> {
        self.config
            .metrics
            .iter()
            .map(|metric| {
                dataset
                    .column_index(metric)
                    .map(|index| (metric.as_str(), index))
                    .ok_or_else(|| AnalysisError::UnknownMetric {
                        metric: metric.clone(),
                    })
            })
            .collect()
    }

    /// Analyzes one endpoint and appends its block to `report`.
    ///
    /// # Arguments
    ///
    /// * `slice` - Samples of the endpoint
    /// * `metrics` - Metric names with their column positions
    /// * `report` - Report receiving the sections
    pub fn analyze_endpoint(
        &self,
        slice: &EndpointSlice<'_>,
        metrics: &[(&str, usize)],
        report: &mut Report,
    ) -> Result<EndpointAnalysis, AnalysisError> {
        let endpoint = slice.name();
        tracing::info!(endpoint, samples = slice.samples().len(), "analyzing endpoint");

        let mut section = report
            .begin_endpoint(endpoint)
            .map_err(AnalysisError::report("endpoint header"))?;

        let overall = DescriptiveTable::summarize(slice.columns(), slice.samples());
        section
            .write_section("descriptive_statistics", Some("overall"), &overall.render())
            .map_err(AnalysisError::report("descriptive_statistics"))?;

        let mut implementations = vec![];
        for group in slice.groups() {
            let statistics = DescriptiveTable::summarize(slice.columns(), group.samples());
            section
                .write_section(
                    "descriptive_statistics",
                    Some(group.implementation()),
                    &statistics.render(),
                )
                .map_err(AnalysisError::report("descriptive_statistics"))?;
            implementations.push(ImplementationSummary {
                implementation: group.implementation().to_owned(),
                statistics,
            });
        }

        let groups = metrics
            .iter()
            .map(|&(metric, column)| MetricGroups::collect(slice, metric, column))
            .collect::<Vec<_>>();

        let mut plots = vec![];
        for metric_groups in &groups {
            let path = match &self.config.plot_dir {
                Some(dir) => Some(plot::write_boxplot(dir, endpoint, metric_groups).map_err(
                    |source| AnalysisError::Plot {
                        metric: metric_groups.metric.to_owned(),
                        source,
                    },
                )?),
                None => None,
            };
            plots.push(path);
        }

        let normality = metrics
            .iter()
            .map(|&(metric, column)| MetricNormality::test(slice, metric, column))
            .collect::<Vec<_>>();
        let body = normality
            .iter()
            .map(MetricNormality::render)
            .collect::<Vec<_>>()
            .join("\n");
        section
            .write_section("normality_tests", None, &body)
            .map_err(AnalysisError::report("normality_tests"))?;

        let comparisons = groups
            .iter()
            .map(MetricComparison::test)
            .collect::<Vec<_>>();
        let body = comparisons
            .iter()
            .map(MetricComparison::render)
            .collect::<Vec<_>>()
            .join("\n");
        section
            .write_section("anova_kruskal_results", None, &body)
            .map_err(AnalysisError::report("anova_kruskal_results"))?;

        let mut results = vec![];
        for (((metric_groups, comparison), normality), plot_path) in
            groups.iter().zip(comparisons).zip(normality).zip(plots)
        {
            let posthoc = PosthocOutcome::analyze(metric_groups, &comparison, SIGNIFICANCE_LEVEL);
            section
                .write_section(
                    "posthoc_analysis",
                    Some(metric_groups.metric),
                    &posthoc.render(metric_groups.metric),
                )
                .map_err(AnalysisError::report("posthoc_analysis"))?;
            results.push(MetricAnalysis {
                metric: metric_groups.metric.to_owned(),
                normality,
                comparison,
                posthoc,
                plot: plot_path,
            });
        }

        section
            .close()
            .map_err(AnalysisError::report("endpoint footer"))?;

        Ok(EndpointAnalysis {
            endpoint: endpoint.to_owned(),
            overall,
            implementations,
            metrics: results,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use chrono::{TimeZone as _, Utc};
    use perfstat_stats::outcome::Outcome;

    use super::*;
    use crate::{posthoc::SkipReason, report::REPORT_FILE_NAME};

    const CSV: &str = "\
endpoint_name,implementation,req_dur_avg_ms
get_attributes,A,100.0
get_attributes,A,101.5
get_attributes,A,99.2
get_attributes,A,100.7
get_attributes,A,98.9
get_attributes,A,100.3
get_attributes,A,101.1
get_attributes,A,99.6
get_attributes,A,100.9
get_attributes,A,99.8
get_attributes,B,500.2
get_attributes,B,499.1
get_attributes,B,501.4
get_attributes,B,498.8
get_attributes,B,500.6
get_attributes,B,499.9
get_attributes,B,502.0
get_attributes,B,500.1
get_attributes,B,498.5
get_attributes,B,501.0
update_values,A,210.0
update_values,A,212.5
update_values,A,208.4
update_values,A,211.3
update_values,C,55.0
";

    struct Run {
        _dir: tempfile::TempDir,
        text: String,
        results: Vec<EndpointAnalysis>,
        plot_dir: PathBuf,
    }

    fn run(csv: &str, finish: bool) -> Run {
        let dir = tempfile::tempdir().unwrap();
        let dataset = Dataset::from_reader(csv.as_bytes(), &["req_dur_avg_ms"]).unwrap();
        let config = AnalysisConfig {
            metrics: vec!["req_dur_avg_ms".to_owned()],
            plot_dir: Some(dir.path().to_owned()),
        };
        let path = dir.path().join(REPORT_FILE_NAME);
        let started_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let assembler = ReportAssembler::new(&config);
        let metrics = assembler.resolve_metrics(&dataset).unwrap();
        let mut report = Report::create(&path, false, started_at).unwrap();
        let results = assembler
            .analyze_dataset(&dataset, &metrics, &mut report)
            .unwrap();
        if finish {
            report.finish().unwrap();
        }
        Run {
            text: fs::read_to_string(&path).unwrap(),
            results,
            plot_dir: dir.path().to_owned(),
            _dir: dir,
        }
    }

    #[test]
    fn test_endpoints_match_distinct_names() {
        let run = run(CSV, true);
        let endpoints = run
            .results
            .iter()
            .map(|r| r.endpoint.as_str())
            .collect::<Vec<_>>();
        assert_eq!(endpoints, ["get_attributes", "update_values"]);
        assert_eq!(run.text.matches("Endpoint: ").count(), 2);
        assert!(run.text.ends_with("// analysis_complete (2 endpoints)\n"));
    }

    #[test]
    fn test_group_counts_sum_to_overall() {
        let run = run(CSV, true);
        for endpoint in &run.results {
            for overall in &endpoint.overall.columns {
                let total = endpoint
                    .implementations
                    .iter()
                    .filter_map(|i| i.statistics.column(&overall.column))
                    .map(|c| c.count())
                    .sum::<usize>();
                assert_eq!(total, overall.count());
            }
        }
    }

    #[test]
    fn test_separated_implementations() {
        let run = run(CSV, true);
        let metric = &run.results[0].metrics[0];
        assert!(metric.comparison.anova.is_significant(SIGNIFICANCE_LEVEL));
        assert!(metric.comparison.kruskal_wallis.is_significant(SIGNIFICANCE_LEVEL));
        let table = metric.posthoc.table().unwrap();
        assert!(table.p_value("A", "B").unwrap() < SIGNIFICANCE_LEVEL);
        assert!(
            run.text
                .contains("// posthoc_analysis (req_dur_avg_ms)\n\n          A         B\n")
        );

        let plot = metric.plot.as_ref().unwrap();
        assert_eq!(
            plot,
            &run.plot_dir.join("boxplot_req_dur_avg_ms_get_attributes.svg")
        );
        let svg = fs::read_to_string(plot).unwrap();
        assert!(svg.contains("Req Dur Avg Ms by Implementation for get_attributes"));
    }

    #[test]
    fn test_one_sample_group() {
        let run = run(CSV, true);
        let metric = &run.results[1].metrics[0];
        let c = &metric.normality.groups[1];
        assert_eq!(c.implementation, "C");
        assert_eq!(
            c.outcome,
            Outcome::InsufficientData {
                required: 3,
                actual: 1
            }
        );
        assert!(run.text.contains(
            "  Implementation: C, insufficient data (1 value, at least 3 required)\n"
        ));
        // ANOVA still has 5 values over 2 groups
        assert!(metric.comparison.anova.is_computed());
    }

    #[test]
    fn test_single_implementation() {
        let csv = "endpoint_name,implementation,req_dur_avg_ms\nlist,A,1.0\nlist,A,2.0\nlist,A,4.0\n";
        let run = run(csv, true);
        let metric = &run.results[0].metrics[0];
        assert_eq!(
            metric.comparison.anova,
            Outcome::NotApplicable { groups: 1 }
        );
        assert_eq!(
            metric.posthoc,
            PosthocOutcome::Skipped {
                reason: SkipReason::NotApplicable
            }
        );
        assert!(run.text.contains(
            "  ANOVA result: not applicable (1 implementation group, at least 2 required)\n"
        ));
    }

    #[test]
    fn test_unfinished_run_has_no_completion_marker() {
        let run = run(CSV, false);
        assert!(run.text.contains("Endpoint: update_values"));
        assert!(!run.text.contains("analysis_complete"));
    }

    #[test]
    fn test_rerun_is_deterministic() {
        let first = run(CSV, true);
        let second = run(CSV, true);
        assert_eq!(first.text, second.text);
        for (a, b) in first.results.iter().zip(&second.results) {
            assert_eq!(a.overall, b.overall);
            assert_eq!(a.implementations, b.implementations);
            for (x, y) in a.metrics.iter().zip(&b.metrics) {
                assert_eq!(x.normality, y.normality);
                assert_eq!(x.comparison, y.comparison);
                assert_eq!(x.posthoc, y.posthoc);
            }
        }
    }

    #[test]
    fn test_unknown_metric() {
        let dataset = Dataset::from_reader(CSV.as_bytes(), &["req_dur_avg_ms"]).unwrap();
        for metric in ["req_dur_p_99_ms", "endpoint_name"] {
            let config = AnalysisConfig {
                metrics: vec![metric.to_owned()],
                plot_dir: None,
            };
            let err = ReportAssembler::new(&config)
                .resolve_metrics(&dataset)
                .unwrap_err();
            assert!(
                matches!(&err, AnalysisError::UnknownMetric { metric: m } if m == metric),
                "{err}"
            );
        }
    }

    #[test]
    fn test_summary_serializes() {
        let run = run(CSV, true);
        let json = serde_json::to_value(&run.results).unwrap();
        assert_eq!(json[0]["endpoint"], "get_attributes");
        assert_eq!(
            json[0]["metrics"][0]["comparison"]["anova"]["status"],
            "computed"
        );
        assert_eq!(json[0]["metrics"][0]["posthoc"]["posthoc"], "performed");
    }
}
