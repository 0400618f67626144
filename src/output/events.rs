//! Events produced while decoding tool output.

use serde::{Deserialize, Serialize};

use crate::diagnostic::{DiagnosticCollection, DiagnosticRecord};
use crate::tools::ToolKind;

use super::{CheckStatus, ModelCheckResult, ProgressStats, ProtocolViolation, TruncatedOutput};

/// Message class carried in the sub-code of a TLC message.
pub mod message_class {
    pub const NONE: u32 = 0;
    pub const ERROR: u32 = 1;
    pub const TLC_BUG: u32 = 2;
    pub const WARNING: u32 = 3;
    pub const STATE: u32 = 4;
}

/// A complete sentinel-delimited block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedMessage {
    pub code: u32,
    pub sub_code: Option<u32>,
    pub lines: Vec<String>,
}

impl ParsedMessage {
    /// Message class, defaulting to [`message_class::NONE`].
    #[must_use]
    pub fn class(&self) -> u32 {
        self.sub_code.unwrap_or(message_class::NONE)
    }

    /// Lines joined with newlines.
    #[must_use]
    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    /// First non-blank line, trimmed.
    #[must_use]
    pub fn first_line(&self) -> Option<&str> {
        self.lines.iter().map(|l| l.trim()).find(|l| !l.is_empty())
    }
}

/// Typed event delivered to live consumers in output order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutputEvent {
    /// A diagnostic was added to the run's collection.
    Diagnostic(DiagnosticRecord),
    /// The model checker moved to a new phase.
    Status { status: CheckStatus },
    /// A progress report arrived.
    Progress(ProgressStats),
    /// The model checker announced it finished; carries the state so far.
    ResultFinalized(Box<ModelCheckResult>),
}

impl OutputEvent {
    /// Returns true if this is the final result event.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ResultFinalized(_))
    }
}

/// Aggregate available once the output stream has ended.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseSummary {
    pub kind: ToolKind,
    pub diagnostics: DiagnosticCollection,
    /// Present for model checker runs.
    pub model_check: Option<ModelCheckResult>,
    /// PlusCal reported a successful translation.
    pub translated: bool,
    pub truncated: Option<TruncatedOutput>,
    pub protocol_violations: Vec<ProtocolViolation>,
}

impl ParseSummary {
    /// True when the stream ended with a message still open.
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.truncated.is_some()
    }
}
