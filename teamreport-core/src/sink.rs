//! Row-oriented report output.
//!
//! A [`TabularSink`] receives one header row and then data rows in order.
//! Reports never talk to a sink directly; they go through [`RowWriter`], which
//! enforces the header-once / fixed-width contract.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{ReportError, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Destination for report rows.
pub trait TabularSink: Send {
    /// Acquires the underlying resource. Called before any other method.
    fn open(&mut self) -> Result<()>;

    /// Writes the header row.
    fn headers(&mut self, headers: &[&str]) -> Result<()>;

    /// Writes one data row.
    fn row(&mut self, fields: &[String]) -> Result<()>;

    /// Flushes and releases the underlying resource.
    ///
    /// Never fails: problems are logged. Calling it on a closed or never
    /// opened sink is a no-op.
    fn close(&mut self);
}

/// CSV file sink.
///
/// Optionally prefixes the file with a UTF-8 byte order mark (for
/// spreadsheet tools that need it) and mirrors every record to stdout.
pub struct CsvSink {
    path: PathBuf,
    bom: bool,
    echo: bool,
    writer: Option<csv::Writer<BufWriter<File>>>,
    echo_writer: Option<csv::Writer<std::io::Stdout>>,
}

impl CsvSink {
    /// Creates a sink for `path`; nothing is touched until [`TabularSink::open`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            bom: false,
            echo: false,
            writer: None,
            echo_writer: None,
        }
    }

    /// Writes a UTF-8 BOM at the start of the file.
    pub fn with_bom(mut self, bom: bool) -> Self {
        self.bom = bom;
        self
    }

    /// Mirrors every record to stdout.
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    /// Output file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_record<I, T>(&mut self, record: I) -> Result<()>
    where
        I: IntoIterator<Item = T> + Clone,
        T: AsRef<[u8]>,
    {
        let Some(writer) = self.writer.as_mut() else {
            return Err(ReportError::sink_contract(format!(
                "{} is not open",
                self.path.display()
            )));
        };
        writer.write_record(record.clone()).map_err(|e| {
            ReportError::sink_failed(format!("Failed to write to {}", self.path.display()), e)
        })?;

        if let Some(echo) = self.echo_writer.as_mut() {
            // Echo is best effort; the file is the report.
            if let Err(e) = echo.write_record(record) {
                warn!("Unable to echo row to stdout: {}", e);
            } else if let Err(e) = echo.flush() {
                warn!("Unable to echo row to stdout: {}", e);
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for CsvSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsvSink")
            .field("path", &self.path)
            .field("bom", &self.bom)
            .field("echo", &self.echo)
            .field("open", &self.writer.is_some())
            .finish()
    }
}

impl TabularSink for CsvSink {
    fn open(&mut self) -> Result<()> {
        if self.writer.is_some() {
            return Err(ReportError::sink_contract(format!(
                "{} is already open",
                self.path.display()
            )));
        }

        let file = File::create(&self.path).map_err(|e| {
            ReportError::sink_failed(format!("Unable to create file {}", self.path.display()), e)
        })?;
        let mut out = BufWriter::new(file);
        if self.bom {
            out.write_all(UTF8_BOM).map_err(|e| {
                ReportError::sink_failed(format!("Failed to write to {}", self.path.display()), e)
            })?;
        }

        self.writer = Some(csv::Writer::from_writer(out));
        if self.echo {
            self.echo_writer = Some(csv::Writer::from_writer(std::io::stdout()));
        }
        debug!("Opened {}", self.path.display());
        Ok(())
    }

    fn headers(&mut self, headers: &[&str]) -> Result<()> {
        self.write_record(headers.iter())
    }

    fn row(&mut self, fields: &[String]) -> Result<()> {
        self.write_record(fields.iter())
    }

    fn close(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                warn!("Unable to flush {}: {}", self.path.display(), e);
            }
            debug!("Closed {}", self.path.display());
        }
        if let Some(mut echo) = self.echo_writer.take()
            && let Err(e) = echo.flush()
        {
            warn!("Unable to flush stdout echo: {}", e);
        }
    }
}

/// Enforces the report output contract on top of a [`TabularSink`].
///
/// - headers are written exactly once, before any row
/// - every row has exactly as many fields as the header
pub struct RowWriter<'a> {
    sink: &'a mut dyn TabularSink,
    width: Option<usize>,
    rows_written: usize,
}

impl<'a> RowWriter<'a> {
    /// Wraps an opened sink.
    pub fn new(sink: &'a mut dyn TabularSink) -> Self {
        Self {
            sink,
            width: None,
            rows_written: 0,
        }
    }

    /// Writes the header row.
    ///
    /// # Errors
    /// Fails when headers were already written, or when the sink fails.
    pub fn write_headers(&mut self, headers: &[&str]) -> Result<()> {
        if self.width.is_some() {
            return Err(ReportError::sink_contract("headers written more than once"));
        }
        self.sink.headers(headers)?;
        self.width = Some(headers.len());
        Ok(())
    }

    /// Writes one data row.
    ///
    /// # Errors
    /// Fails when no header was written yet, when the row width differs
    /// from the header width, or when the sink fails.
    pub fn write_row(&mut self, fields: &[String]) -> Result<()> {
        let Some(width) = self.width else {
            return Err(ReportError::sink_contract("row written before headers"));
        };
        if fields.len() != width {
            return Err(ReportError::sink_contract(format!(
                "row has {} fields, header has {}",
                fields.len(),
                width
            )));
        }
        self.sink.row(fields)?;
        self.rows_written = self.rows_written.saturating_add(1);
        Ok(())
    }

    /// Number of data rows written so far.
    pub const fn rows_written(&self) -> usize {
        self.rows_written
    }
}
