//! Errors raised while locating, spawning and waiting on tools.

use std::path::PathBuf;

use crate::tools::{SpecError, ToolKind};

/// Error type for process spawning operations.
#[derive(thiserror::Error, Debug)]
pub enum SpawnError {
    /// The executable was not found.
    #[error("Executable not found: {0}")]
    NotFound(PathBuf),
    /// Permission denied when spawning.
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),
    /// Other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpawnError {
    /// Create a `SpawnError` from an I/O error, classifying common cases.
    pub(crate) fn from_io(program: impl Into<PathBuf>, err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(program.into()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(program.into()),
            _ => Self::Io(err),
        }
    }
}

/// Errors raised while preparing, running or waiting on a tool.
#[derive(thiserror::Error, Debug)]
pub enum ToolError {
    /// No usable Java runtime.
    #[error("Java runtime unavailable: {0}")]
    ToolingUnavailable(String),
    #[error("Failed to start tool process: {0}")]
    Spawn(#[from] SpawnError),
    /// The tool exited with a code reserved for launcher or JVM failures.
    #[error("{tool} failed with exit code {code}: {stderr}")]
    ToolingFailure {
        tool: ToolKind,
        code: i32,
        stderr: String,
    },
    #[error("Tool process stdout is not available")]
    NoStdout,
    #[error(transparent)]
    Spec(#[from] SpecError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
