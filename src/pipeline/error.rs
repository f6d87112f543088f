//! Pipeline fault taxonomy.
//!
//! Only genuine execution faults live here. A missing or unreadable path is
//! a 404 *response*, and a gatekeeper rejection is a normal pipeline
//! outcome; neither is represented as an error value.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// A hard fault during pipeline execution.
///
/// Any of these aborts the remaining pipeline for the request and yields
/// the fixed internal-error response.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to spawn {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stage i/o failure on {path}: {source}")]
    StageIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stage {path} exceeded the {timeout:?} execution bound")]
    Timeout { path: PathBuf, timeout: Duration },

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl EngineError {
    /// The path the fault occurred on, for structured logging.
    pub fn path(&self) -> &std::path::Path {
        match self {
            EngineError::Spawn { path, .. }
            | EngineError::StageIo { path, .. }
            | EngineError::Timeout { path, .. }
            | EngineError::Read { path, .. } => path,
        }
    }
}
