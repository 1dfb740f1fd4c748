//! Tracer errors.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by trace file sessions.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The trace file could not be created.
    #[error("failed to open trace file {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing buffered rows to the trace file failed.
    #[error("failed to write trace file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TraceError {
    /// Path of the trace file involved.
    pub fn path(&self) -> &std::path::Path {
        match self {
            TraceError::Open { path, .. } | TraceError::Write { path, .. } => path,
        }
    }
}
