use clap::{Parser, Subcommand};

use self::{analyze::AnalyzeArg, describe::DescribeArg};
use crate::util;

mod analyze;
mod describe;

/// Default input file when no path is given.
const DEFAULT_INPUT: &str = "k6_performance_data.csv";

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// What mode to run the program in
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Run the full analysis and write the report and boxplots
    Analyze(#[clap(flatten)] AnalyzeArg),
    /// Print descriptive statistics for each endpoint
    Describe(#[clap(flatten)] DescribeArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    util::init_tracing(args.verbose);
    match args
        .mode
        .unwrap_or_else(|| Mode::Analyze(AnalyzeArg::default()))
    {
        Mode::Analyze(arg) => analyze::run(&arg)?,
        Mode::Describe(arg) => describe::run(&arg)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analyze_defaults_match_parser() {
        let args = CommandArgs::try_parse_from(["perfstat", "analyze"]).unwrap();
        let Some(Mode::Analyze(arg)) = args.mode else {
            panic!("expected analyze mode");
        };
        let default = AnalyzeArg::default();
        assert_eq!(arg.input, default.input);
        assert_eq!(arg.output_dir, default.output_dir);
        assert_eq!(arg.metrics, default.metrics);
        assert_eq!(arg.append, default.append);
        assert_eq!(arg.no_plots, default.no_plots);
        assert_eq!(arg.summary_json, default.summary_json);
    }

    #[test]
    fn test_no_subcommand() {
        let args = CommandArgs::try_parse_from(["perfstat", "--verbose"]).unwrap();
        assert!(args.verbose);
        assert!(args.mode.is_none());
    }

    #[test]
    fn test_metric_list() {
        let args = CommandArgs::try_parse_from([
            "perfstat",
            "analyze",
            "results.csv",
            "--metrics",
            "a_ms,b_ms",
            "--no-plots",
        ])
        .unwrap();
        let Some(Mode::Analyze(arg)) = args.mode else {
            panic!("expected analyze mode");
        };
        assert_eq!(arg.input.to_str(), Some("results.csv"));
        assert_eq!(arg.metrics, ["a_ms", "b_ms"]);
        assert!(arg.no_plots);
    }
}
