//! Loading performance samples and partitioning them by endpoint and implementation.
//!
//! # Input Format
//!
//! The input is a CSV file with a header row. Two categorical columns are
//! required, `endpoint_name` and `implementation`, together with every
//! requested metric column:
//!
//! ```text
//! endpoint_name,implementation,req_dur_avg_ms,req_dur_p_90_ms,req_dur_p_95_ms
//! get_attributes,traditional,101.2,130.5,141.0
//! get_attributes,vertical_slice,98.7,125.1,139.8
//! ```
//!
//! Every other column whose non-empty cells all parse as numbers is kept as
//! an extra numeric column and shows up in descriptive summaries. Empty cells
//! and `NaN` are stored as missing values. Infinite values are rejected in
//! metric columns and stored as missing elsewhere.
//!
//! # Partitioning
//!
//! [`Dataset::endpoints`] splits samples into [`EndpointSlice`]s and
//! [`EndpointSlice::groups`] splits an endpoint into [`ImplementationGroup`]s.
//! Both enumerate in order of first appearance in the input.

use std::io;

use serde::Serialize;

/// Name of the column holding the endpoint category.
pub const ENDPOINT_COLUMN: &str = "endpoint_name";

/// Name of the column holding the implementation category.
pub const IMPLEMENTATION_COLUMN: &str = "implementation";

/// Latency metrics analyzed when none are requested explicitly.
pub const DEFAULT_METRICS: [&str; 3] = ["req_dur_avg_ms", "req_dur_p_90_ms", "req_dur_p_95_ms"];

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum DatasetError {
    #[display("failed to read CSV input: {source}")]
    Csv { source: csv::Error },
    #[display("required column '{column}' is missing")]
    MissingColumn { column: String },
    #[display("line {line}: invalid value '{value}' in metric column '{column}'")]
    InvalidValue {
        line: u64,
        column: String,
        value: String,
    },
    #[display("line {line}: empty value in column '{column}'")]
    MissingCategory { line: u64, column: String },
    #[display("input contains no samples")]
    Empty,
}

impl From<csv::Error> for DatasetError {
    fn from(source: csv::Error) -> Self {
        Self::Csv { source }
    }
}

/// One row of the input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sample {
    pub endpoint_name: String,
    pub implementation: String,
    /// One value per numeric column of the owning [`Dataset`], `None` when missing.
    pub values: Vec<Option<f64>>,
}

impl Sample {
    /// Value of the numeric column at `index`, if present.
    #[must_use]
    pub fn value(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied().flatten()
    }
}

/// Ordered collection of samples together with their numeric column names.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    columns: Vec<String>,
    samples: Vec<Sample>,
}

struct ColumnSpec {
    name: String,
    index: usize,
    required: bool,
}

impl Dataset {
    /// Reads a dataset from CSV, validating the category and metric columns.
    ///
    /// # Arguments
    ///
    /// * `reader` - CSV input with a header row
    /// * `metrics` - Metric columns that must exist and hold only numbers
    ///
    /// # Examples
    ///
    /// ```
    /// use perfstat_analysis::dataset::Dataset;
    ///
    /// let csv = "endpoint_name,implementation,latency\n\
    ///            list,a,10.5\n\
    ///            list,b,12.0\n";
    /// let dataset = Dataset::from_reader(csv.as_bytes(), &["latency"]).unwrap();
    /// assert_eq!(dataset.columns(), ["latency"]);
    /// assert_eq!(dataset.samples().len(), 2);
    /// ```
    pub fn from_reader<R, S>(reader: R, metrics: &[S]) -> Result<Self, DatasetError>
    where
        R: io::Read,
        S: AsRef<str>,
    {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = reader.headers()?.clone();

        let find = |column: &str| {
            headers
                .iter()
                .position(|h| h == column)
                .ok_or_else(|| DatasetError::MissingColumn {
                    column: column.to_owned(),
                })
        };
        let endpoint_index = find(ENDPOINT_COLUMN)?;
        let implementation_index = find(IMPLEMENTATION_COLUMN)?;
        for metric in metrics {
            find(metric.as_ref())?;
        }

        let records = reader.records().collect::<Result<Vec<_>, _>>()?;
        if records.is_empty() {
            return Err(DatasetError::Empty);
        }

        let mut specs = vec![];
        for (index, name) in headers.iter().enumerate() {
            if index == endpoint_index || index == implementation_index {
                continue;
            }
            let required = metrics.iter().any(|m| m.as_ref() == name);
            if !required
                && records
                    .iter()
                    .any(|r| parse_cell(&r[index]) == Err(CellError::NotNumeric))
            {
                tracing::debug!(column = name, "ignoring non-numeric column");
                continue;
            }
            specs.push(ColumnSpec {
                name: name.to_owned(),
                index,
                required,
            });
        }

        let mut samples = Vec::with_capacity(records.len());
        for (row, record) in records.iter().enumerate() {
            let line = record
                .position()
                .map_or(row as u64 + 2, csv::Position::line);
            let category = |index: usize, column: &str| {
                let value = &record[index];
                if value.is_empty() {
                    return Err(DatasetError::MissingCategory {
                        line,
                        column: column.to_owned(),
                    });
                }
                Ok(value.to_owned())
            };
            let endpoint_name = category(endpoint_index, ENDPOINT_COLUMN)?;
            let implementation = category(implementation_index, IMPLEMENTATION_COLUMN)?;

            let values = specs
                .iter()
                .map(|spec| {
                    let cell = &record[spec.index];
                    match parse_cell(cell) {
                        Ok(value) => Ok(value),
                        Err(_) if spec.required => Err(DatasetError::InvalidValue {
                            line,
                            column: spec.name.clone(),
                            value: cell.to_owned(),
                        }),
                        Err(_) => Ok(None),
                    }
                })
                .collect::<Result<Vec<_>, _>>()?;

            samples.push(Sample {
                endpoint_name,
                implementation,
                values,
            });
        }

        let columns = specs.into_iter().map(|spec| spec.name).collect::<Vec<_>>();
        tracing::debug!(
            samples = samples.len(),
            columns = columns.len(),
            "loaded dataset"
        );
        Ok(Self { columns, samples })
    }

    /// Builds a dataset from samples already in memory.
    ///
    /// # Panics
    ///
    /// Panics if a sample does not carry one value per column, has an empty
    /// category or holds a non-finite value.
    #[must_use]
    pub fn from_samples(columns: Vec<String>, samples: Vec<Sample>) -> Self {
        for sample in &samples {
            assert_eq!(sample.values.len(), columns.len(), "value count mismatch");
            assert!(
                !sample.endpoint_name.is_empty() && !sample.implementation.is_empty(),
                "categories must not be empty"
            );
            assert!(
                sample.values.iter().flatten().all(|v| v.is_finite()),
                "values must be finite"
            );
        }
        Self { columns, samples }
    }

    /// Numeric column names, in input order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    #[must_use]
    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    /// Position of the numeric column `name`.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Splits the samples by endpoint, in order of first appearance.
    #[must_use]
    pub fn endpoints(&self) -> Vec<EndpointSlice<'_>> {
        partition(&self.samples, |s| s.endpoint_name.as_str())
            .into_iter()
            .map(|(name, samples)| EndpointSlice {
                name,
                columns: &self.columns,
                samples,
            })
            .collect()
    }
}

/// Why a cell cannot hold a metric value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CellError {
    NotNumeric,
    NotFinite,
}

/// Parses a numeric cell; empty cells and `NaN` are missing.
fn parse_cell(cell: &str) -> Result<Option<f64>, CellError> {
    if cell.is_empty() {
        return Ok(None);
    }
    let value = cell.parse::<f64>().map_err(|_| CellError::NotNumeric)?;
    if value.is_nan() {
        return Ok(None);
    }
    if value.is_infinite() {
        return Err(CellError::NotFinite);
    }
    Ok(Some(value))
}

fn partition<'a, I, F>(samples: I, key: F) -> Vec<(&'a str, Vec<&'a Sample>)>
where
    I: IntoIterator<Item = &'a Sample>,
    F: Fn(&'a Sample) -> &'a str,
{
    let mut parts: Vec<(&'a str, Vec<&'a Sample>)> = vec![];
    for sample in samples {
        let name = key(sample);
        match parts.iter_mut().find(|(n, _)| *n == name) {
            Some((_, members)) => members.push(sample),
            None => parts.push((name, vec![sample])),
        }
    }
    parts
}

fn present_values(samples: &[&Sample], column: usize) -> Vec<f64> {
    samples.iter().filter_map(|s| s.value(column)).collect()
}

/// Samples sharing one endpoint.
#[derive(Debug, Clone)]
pub struct EndpointSlice<'a> {
    name: &'a str,
    columns: &'a [String],
    samples: Vec<&'a Sample>,
}

impl<'a> EndpointSlice<'a> {
    #[must_use]
    pub fn name(&self) -> &'a str {
        self.name
    }

    #[must_use]
    pub fn columns(&self) -> &'a [String] {
        self.columns
    }

    #[must_use]
    pub fn samples(&self) -> &[&'a Sample] {
        &self.samples
    }

    /// Non-missing values of the numeric column at `column`.
    #[must_use]
    pub fn values(&self, column: usize) -> Vec<f64> {
        present_values(&self.samples, column)
    }

    /// Splits the endpoint by implementation, in order of first appearance.
    #[must_use]
    pub fn groups(&self) -> Vec<ImplementationGroup<'a>> {
        partition(self.samples.iter().copied(), |s| s.implementation.as_str())
            .into_iter()
            .map(|(implementation, samples)| ImplementationGroup {
                implementation,
                samples,
            })
            .collect()
    }
}

/// Samples of one endpoint sharing one implementation.
#[derive(Debug, Clone)]
pub struct ImplementationGroup<'a> {
    implementation: &'a str,
    samples: Vec<&'a Sample>,
}

impl<'a> ImplementationGroup<'a> {
    #[must_use]
    pub fn implementation(&self) -> &'a str {
        self.implementation
    }

    #[must_use]
    pub fn samples(&self) -> &[&'a Sample] {
        &self.samples
    }

    /// Non-missing values of the numeric column at `column`.
    #[must_use]
    pub fn values(&self, column: usize) -> Vec<f64> {
        present_values(&self.samples, column)
    }
}
