use std::{io::Write as _, path::PathBuf};

use anyhow::Context;
use clap::Args;
use perfstat_analysis::{pipeline::ImplementationSummary, summary::DescriptiveTable};
use serde::Serialize;

use super::DEFAULT_INPUT;
use crate::util::{self, Output};

#[derive(Debug, Clone, Args)]
pub(crate) struct DescribeArg {
    /// Path to the performance results CSV file
    #[arg(default_value = DEFAULT_INPUT)]
    pub input: PathBuf,

    /// Also summarize each implementation separately
    #[arg(long)]
    pub by_implementation: bool,

    /// Emit JSON instead of text tables
    #[arg(long)]
    pub json: bool,

    /// Output file path (default: stdout)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct EndpointDescription {
    endpoint: String,
    overall: DescriptiveTable,
    implementations: Vec<ImplementationSummary>,
}

pub(crate) fn run(arg: &DescribeArg) -> anyhow::Result<()> {
    let dataset = util::read_dataset::<&str>(&arg.input, &[])?;

    let descriptions = dataset
        .endpoints()
        .iter()
        .map(|slice| {
            let implementations = if arg.by_implementation {
                slice
                    .groups()
                    .iter()
                    .map(|group| ImplementationSummary {
                        implementation: group.implementation().to_owned(),
                        statistics: DescriptiveTable::summarize(slice.columns(), group.samples()),
                    })
                    .collect()
            } else {
                vec![]
            };
            EndpointDescription {
                endpoint: slice.name().to_owned(),
                overall: DescriptiveTable::summarize(slice.columns(), slice.samples()),
                implementations,
            }
        })
        .collect::<Vec<_>>();

    let mut output = Output::from_output_path(arg.output.clone())?;
    if arg.json {
        return output.write_json(&descriptions);
    }

    for description in &descriptions {
        writeln!(output, "Endpoint: {}", description.endpoint)
            .and_then(|()| writeln!(output, "{}\n", description.overall))
            .with_context(|| format!("Failed to write to {}", output.display_path()))?;
        for summary in &description.implementations {
            writeln!(
                output,
                "Implementation: {}\n{}\n",
                summary.implementation, summary.statistics
            )
            .with_context(|| format!("Failed to write to {}", output.display_path()))?;
        }
    }
    output
        .flush()
        .with_context(|| format!("Failed to flush output to {}", output.display_path()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const CSV: &str = "\
endpoint_name,implementation,req_dur_avg_ms
list,A,100
list,A,102
list,B,300
show,A,50
";

    fn describe(by_implementation: bool, json: bool) -> String {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("data.csv");
        fs::write(&input, CSV).unwrap();
        let output = dir.path().join("describe.out");
        let arg = DescribeArg {
            input,
            by_implementation,
            json,
            output: Some(output.clone()),
        };
        run(&arg).unwrap();
        fs::read_to_string(output).unwrap()
    }

    #[test]
    fn test_text_tables() {
        let text = describe(false, false);
        assert!(text.starts_with("Endpoint: list\n"));
        assert!(text.contains("\nEndpoint: show\n"));
        // values are right-aligned under the 14-character column name
        assert!(text.contains(&format!("count  {:>14}", "3.000000")));
        assert!(text.contains(&format!("mean   {:>14}", "167.333333")));
        assert!(!text.contains("Implementation:"));
    }

    #[test]
    fn test_by_implementation() {
        let text = describe(true, false);
        let list = &text[..text.find("Endpoint: show").unwrap()];
        assert!(list.contains("Implementation: A\n"));
        assert!(list.contains("Implementation: B\n"));
        assert!(list.contains(&format!("mean   {:>14}", "101.000000")));
    }

    #[test]
    fn test_json() {
        let json: serde_json::Value = serde_json::from_str(&describe(true, true)).unwrap();
        assert_eq!(json[0]["endpoint"], "list");
        assert_eq!(json[0]["overall"]["columns"][0]["column"], "req_dur_avg_ms");
        assert_eq!(json[0]["overall"]["columns"][0]["stats"]["count"], 3);
        assert_eq!(json[0]["implementations"][1]["implementation"], "B");
        assert_eq!(json[1]["endpoint"], "show");
        assert!(json[1]["overall"]["columns"][0]["stats"]["std_dev"].is_null());
    }
}
