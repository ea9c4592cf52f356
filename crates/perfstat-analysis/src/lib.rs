//! Exploratory statistical analysis of performance-test results
//!
//! This crate turns a table of latency samples, tagged by endpoint and
//! implementation, into a cumulative text report and one boxplot per
//! endpoint and metric.
//!
//! # Overview
//!
//! ```text
//! CSV input
//!     ↓
//! Dataset (dataset::Dataset)
//!     ↓ partition by endpoint
//! EndpointSlice ──┬─ DescriptiveTable (overall and per implementation)
//!                 ├─ boxplot SVG per metric
//!                 ├─ MetricNormality (Shapiro-Wilk per implementation)
//!                 ├─ MetricComparison (ANOVA, Kruskal-Wallis)
//!                 └─ PosthocOutcome (Dunn, only after a significant comparison)
//!     ↓
//! Report (analysis_results.txt)
//! ```
//!
//! # Modules
//!
//! - [`dataset`]: CSV loading and partitioning by endpoint and implementation
//! - [`summary`]: Descriptive tables
//! - [`normality`]: Per-implementation normality tests
//! - [`comparison`]: Omnibus comparisons across implementations
//! - [`posthoc`]: Pairwise comparisons after a significant omnibus test
//! - [`plot`]: SVG boxplots
//! - [`report`]: The append-only text report
//! - [`pipeline`]: Orchestration of the above per endpoint
//!
//! # Examples
//!
//! ```no_run
//! use chrono::Utc;
//! use perfstat_analysis::{
//!     dataset::{DEFAULT_METRICS, Dataset},
//!     pipeline::{AnalysisConfig, ReportAssembler},
//!     report::Report,
//! };
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//!
//! let file = std::fs::File::open("k6_performance_data.csv")?;
//! let dataset = Dataset::from_reader(file, &DEFAULT_METRICS)?;
//!
//! let config = AnalysisConfig {
//!     metrics: DEFAULT_METRICS.map(String::from).to_vec(),
//!     plot_dir: Some("analysis_results".into()),
//! };
//! let assembler = ReportAssembler::new(&config);
//! let metrics = assembler.resolve_metrics(&dataset)?;
//! let mut report = Report::create("analysis_results/analysis_results.txt", false, Utc::now())?;
//! let endpoints = assembler.analyze_dataset(&dataset, &metrics, &mut report)?;
//! report.finish()?;
//!
//! println!("Analyzed {} endpoints", endpoints.len());
//! # Ok(())
//! # }
//! ```

pub mod comparison;
pub mod dataset;
pub mod normality;
pub mod pipeline;
pub mod plot;
pub mod posthoc;
pub mod report;
pub mod summary;
