use crate::output::StreamError;
use crate::process::ToolError;

use super::ActiveCheck;

/// Error type for check workflows.
#[derive(thiserror::Error, Debug)]
pub enum CheckError {
    /// Another model check holds the slot.
    #[error("Another model checking process is already running ({})", .0.spec.tla_path().display())]
    AlreadyRunning(Box<ActiveCheck>),

    /// Nothing to cancel.
    #[error("There are no currently running model checking processes")]
    NotRunning,

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error(transparent)]
    Stream(#[from] StreamError),

    /// The debugger front end could not attach.
    #[error("Debugger attach failed: {0}")]
    Attach(#[source] std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Task join error.
    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}
