//! Full analysis command
//!
//! Loads the dataset, writes the cumulative report and one boxplot per
//! endpoint and metric into the output directory, and optionally dumps every
//! computed statistic as JSON.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Args;
use perfstat_analysis::{
    dataset::DEFAULT_METRICS,
    pipeline::{AnalysisConfig, EndpointAnalysis, ReportAssembler, SIGNIFICANCE_LEVEL},
    report::{REPORT_FILE_NAME, Report},
};
use serde::Serialize;

use super::DEFAULT_INPUT;
use crate::util;

const DEFAULT_OUTPUT_DIR: &str = "analysis_results";

#[derive(Debug, Clone, Args)]
pub(crate) struct AnalyzeArg {
    /// Path to the performance results CSV file
    #[arg(default_value = DEFAULT_INPUT)]
    pub input: PathBuf,

    /// Directory receiving the report and boxplots
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// Metric columns to analyze (comma-separated)
    #[arg(long, value_delimiter = ',', default_values = DEFAULT_METRICS)]
    pub metrics: Vec<String>,

    /// Append to an existing report instead of replacing it
    #[arg(long)]
    pub append: bool,

    /// Skip boxplot rendering
    #[arg(long)]
    pub no_plots: bool,

    /// Write every computed statistic as JSON to this path
    #[arg(long)]
    pub summary_json: Option<PathBuf>,
}

impl Default for AnalyzeArg {
    fn default() -> Self {
        Self {
            input: PathBuf::from(DEFAULT_INPUT),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            metrics: DEFAULT_METRICS.map(String::from).to_vec(),
            append: false,
            no_plots: false,
            summary_json: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct AnalysisSummary<'a> {
    started_at: DateTime<Utc>,
    input: &'a Path,
    significance_level: f64,
    endpoints: &'a [EndpointAnalysis],
}

pub(crate) fn run(arg: &AnalyzeArg) -> anyhow::Result<()> {
    let started_at = Utc::now();

    tracing::info!(input = %arg.input.display(), "loading data");
    let dataset = util::read_dataset(&arg.input, &arg.metrics)?;
    tracing::info!(
        samples = dataset.samples().len(),
        columns = dataset.columns().len(),
        "data loaded"
    );

    let config = AnalysisConfig {
        metrics: arg.metrics.clone(),
        plot_dir: (!arg.no_plots).then(|| arg.output_dir.clone()),
    };
    let assembler = ReportAssembler::new(&config);
    let metrics = assembler
        .resolve_metrics(&dataset)
        .with_context(|| format!("Invalid metrics for {}", arg.input.display()))?;

    fs::create_dir_all(&arg.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            arg.output_dir.display()
        )
    })?;
    let report_path = arg.output_dir.join(REPORT_FILE_NAME);
    let mut report = Report::create(&report_path, arg.append, started_at)
        .with_context(|| format!("Failed to create report file: {}", report_path.display()))?;

    let endpoints = assembler
        .analyze_dataset(&dataset, &metrics, &mut report)
        .with_context(|| format!("Failed to analyze {}", arg.input.display()))?;
    report
        .finish()
        .with_context(|| format!("Failed to finish report file: {}", report_path.display()))?;

    if let Some(path) = &arg.summary_json {
        let summary = AnalysisSummary {
            started_at,
            input: &arg.input,
            significance_level: SIGNIFICANCE_LEVEL,
            endpoints: &endpoints,
        };
        util::Output::save_json(&summary, Some(path.clone()))?;
        tracing::info!(path = %path.display(), "summary written");
    }

    println!(
        "Analysis complete. Results have been saved to the '{}' directory.",
        arg.output_dir.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
endpoint_name,implementation,req_dur_avg_ms,req_dur_p_90_ms,req_dur_p_95_ms
list,A,100,120,130
list,A,102,121,133
list,A,99,119,128
list,B,300,350,360
list,B,310,352,366
list,B,305,349,361
";

    #[test]
    fn test_run_writes_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("data.csv");
        fs::write(&input, CSV).unwrap();
        let output_dir = dir.path().join("out");
        let summary_json = dir.path().join("summary.json");

        let arg = AnalyzeArg {
            input,
            output_dir: output_dir.clone(),
            summary_json: Some(summary_json.clone()),
            ..AnalyzeArg::default()
        };
        run(&arg).unwrap();

        let report = fs::read_to_string(output_dir.join(REPORT_FILE_NAME)).unwrap();
        assert!(report.contains("Endpoint: list"));
        assert!(report.ends_with("// analysis_complete (1 endpoints)\n"));
        for metric in DEFAULT_METRICS {
            assert!(output_dir.join(format!("boxplot_{metric}_list.svg")).exists());
        }

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&summary_json).unwrap()).unwrap();
        assert_eq!(summary["significance_level"], 0.05);
        assert_eq!(summary["endpoints"][0]["endpoint"], "list");
    }

    #[test]
    fn test_missing_input_fails_before_output() {
        let dir = tempfile::tempdir().unwrap();
        let output_dir = dir.path().join("out");
        let arg = AnalyzeArg {
            input: dir.path().join("missing.csv"),
            output_dir: output_dir.clone(),
            ..AnalyzeArg::default()
        };
        let err = run(&arg).unwrap_err();
        assert!(format!("{err:#}").contains("missing.csv"));
        assert!(!output_dir.exists());
    }

    #[test]
    fn test_category_metric_fails_before_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("data.csv");
        fs::write(&input, CSV).unwrap();
        let output_dir = dir.path().join("out");
        let arg = AnalyzeArg {
            input,
            output_dir: output_dir.clone(),
            metrics: vec!["endpoint_name".to_owned()],
            ..AnalyzeArg::default()
        };
        let err = run(&arg).unwrap_err();
        assert!(format!("{err:#}").contains("metric 'endpoint_name'"));
        assert!(!output_dir.exists());
    }
}
