//! Buffered trace file output.
//!
//! Rows accumulate in memory and reach the file in 32 KiB batches, so the
//! emulation thread pays for one write per few hundred rows instead of one
//! per instruction. The file is opened in binary mode: rows are separated
//! by `\n` on every platform.
//!
//! Write errors are not retried. The first one is kept and reported when
//! the session is finished; nothing is written after it.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::error::TraceError;
use super::format::RowFormatter;
use super::ring::TraceRow;

/// Buffered text is written out once it grows past this many bytes.
pub const FLUSH_THRESHOLD: usize = 32 * 1024;

/// Writer behind a logging session.
pub type BoxedWriter = Box<dyn Write + Send>;

/// An open trace file plus its pending text.
pub struct FileSink<W: Write = BoxedWriter> {
    path: PathBuf,
    writer: W,
    buffer: String,
    first_line: bool,
    error: Option<io::Error>,
}

impl FileSink {
    /// Create (or truncate) the trace file at `path`.
    pub fn create(path: &Path) -> Result<Self, TraceError> {
        let file = File::create(path).map_err(|source| TraceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_writer(path, Box::new(file)))
    }
}

impl<W: Write> FileSink<W> {
    /// Wrap an already open writer. `path` is only used in errors.
    pub fn from_writer(path: &Path, writer: W) -> Self {
        Self {
            path: path.to_path_buf(),
            writer,
            buffer: String::with_capacity(FLUSH_THRESHOLD + 1024),
            first_line: true,
            error: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Format `row` into the buffer, writing the buffer out once it
    /// exceeds `FLUSH_THRESHOLD`.
    pub fn push_row(&mut self, formatter: &RowFormatter<'_>, row: &TraceRow) {
        formatter.write_row(
            &mut self.buffer,
            &row.state,
            row.disassembly.as_ref(),
            self.first_line,
        );
        self.first_line = false;

        if self.buffer.len() > FLUSH_THRESHOLD {
            self.flush_buffer();
        }
    }

    /// Write ` - [label - Cycle: N]` right after the last row.
    ///
    /// Buffered rows are written first so the annotation lands in order.
    /// Does nothing before the first row of the session.
    pub fn annotate(&mut self, label: &str, cycle_count: u64) -> bool {
        if self.first_line {
            return false;
        }

        self.flush_buffer();
        let suffix = format!(" - [{} - Cycle: {}]", label, cycle_count);
        self.write_out(suffix.as_bytes());
        true
    }

    /// Write remaining text, flush and close the file.
    ///
    /// Returns the first write error seen during the session.
    pub fn finish(mut self) -> Result<(), TraceError> {
        self.flush_buffer();
        if self.error.is_none() {
            if let Err(e) = self.writer.flush() {
                self.error = Some(e);
            }
        }

        match self.error.take() {
            Some(source) => Err(TraceError::Write {
                path: self.path,
                source,
            }),
            None => Ok(()),
        }
    }

    fn flush_buffer(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.buffer);
        self.write_out(text.as_bytes());
        // Keep the allocation for the next batch.
        self.buffer = text;
        self.buffer.clear();
    }

    fn write_out(&mut self, bytes: &[u8]) {
        if self.error.is_some() {
            return;
        }
        if let Err(e) = self.writer.write_all(bytes) {
            log::warn!("Trace file {} write failed: {}", self.path.display(), e);
            self.error = Some(e);
        }
    }
}
