//! The cumulative text report.
//!
//! A run starts with a timestamped marker line, then appends one block per
//! endpoint, and ends with a completion marker only when every endpoint was
//! written. A report without the completion marker comes from an aborted run.
//!
//! ```text
//! // analysis_run (started 2024-05-01T12:00:00Z)
//!
//! ---
//! Endpoint: get_attributes
//! ---
//!
//! ---
//! // descriptive_statistics (overall)
//!
//! <table>
//! ---
//! ...
//! // analysis_complete (1 endpoints)
//! ```

use std::{
    fs::{File, OpenOptions},
    io::{self, BufWriter, Write as _},
    path::{Path, PathBuf},
};

use chrono::{DateTime, SecondsFormat, Utc};

/// File name of the report inside the output directory.
pub const REPORT_FILE_NAME: &str = "analysis_results.txt";

/// Handle to the report file of one run.
#[derive(Debug)]
pub struct Report {
    path: PathBuf,
    completed_endpoints: usize,
}

impl Report {
    /// Opens the report at `path` and writes the run marker.
    ///
    /// An existing report is truncated unless `append` is set.
    pub fn create<P>(path: P, append: bool, started_at: DateTime<Utc>) -> io::Result<Self>
    where
        P: Into<PathBuf>,
    {
        let path = path.into();
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(&path)?;
        writeln!(
            file,
            "// analysis_run (started {})",
            started_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        )?;
        Ok(Self {
            path,
            completed_endpoints: 0,
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of endpoint blocks closed so far.
    #[must_use]
    pub fn completed_endpoints(&self) -> usize {
        self.completed_endpoints
    }

    /// Opens the block of `endpoint` and writes its header.
    pub fn begin_endpoint(&mut self, endpoint: &str) -> io::Result<EndpointSection<'_>> {
        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = BufWriter::new(file);
        write!(writer, "\n---\nEndpoint: {endpoint}\n---\n")?;
        Ok(EndpointSection {
            report: self,
            writer,
        })
    }

    /// Writes the completion marker.
    pub fn finish(self) -> io::Result<()> {
        let mut file = OpenOptions::new().append(true).open(&self.path)?;
        writeln!(
            file,
            "\n// analysis_complete ({} endpoints)",
            self.completed_endpoints
        )?;
        Ok(())
    }
}

/// Writer scoped to one endpoint block.
///
/// Buffered output is flushed by [`EndpointSection::close`], or on drop.
#[derive(Debug)]
pub struct EndpointSection<'a> {
    report: &'a mut Report,
    writer: BufWriter<File>,
}

impl EndpointSection<'_> {
    /// Appends a framed section.
    ///
    /// # Arguments
    ///
    /// * `name` - Section name, such as `descriptive_statistics`
    /// * `qualifier` - Optional text shown in parentheses after the name
    /// * `body` - Section contents
    pub fn write_section(
        &mut self,
        name: &str,
        qualifier: Option<&str>,
        body: &str,
    ) -> io::Result<()> {
        match qualifier {
            Some(qualifier) => write!(self.writer, "\n---\n// {name} ({qualifier})\n\n")?,
            None => write!(self.writer, "\n---\n// {name}\n\n")?,
        }
        self.writer.write_all(body.as_bytes())?;
        if !body.ends_with('\n') {
            self.writer.write_all(b"\n")?;
        }
        self.writer.write_all(b"---\n")
    }

    /// Flushes the block and counts the endpoint as complete.
    pub fn close(mut self) -> io::Result<()> {
        self.writer.flush()?;
        self.report.completed_endpoints += 1;
        Ok(())
    }
}

impl Drop for EndpointSection<'_> {
    fn drop(&mut self) {
        if let Err(err) = self.writer.flush() {
            tracing::error!(path = %self.report.path.display(), "failed to flush report: {err}");
        }
    }
}
