//! Accumulated state of a model checking run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::diagnostic::{DiagnosticCollection, Range};

/// Phase of a TLC run as reported in its output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    #[default]
    NotStarted,
    Starting,
    SanyParsing,
    Checking,
    Finished,
}

/// Facts TLC prints about itself when starting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessInfo {
    /// Version banner, e.g. `TLC2 Version 2.18 of ...`.
    pub version: Option<String>,
    /// Search mode line (`Running breadth-first search ...`).
    pub mode: Option<String>,
    pub workers: Option<u32>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Duration text TLC prints when finishing (`Finished in 01s ...`).
    pub finish_text: Option<String>,
}

/// One progress report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressStats {
    pub depth: Option<u64>,
    pub generated: u64,
    pub distinct: u64,
    pub left: u64,
    pub generated_per_minute: Option<u64>,
    pub distinct_per_minute: Option<u64>,
}

/// Coverage counters for one action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageItem {
    pub module: String,
    pub action: String,
    pub range: Range,
    pub distinct: u64,
    pub total: u64,
}

/// A variable assignment inside a trace state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceVariable {
    pub name: String,
    pub value: String,
}

/// One state of an error trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceState {
    pub number: u32,
    /// Action label, e.g. `Initial predicate` or `Next`.
    pub title: String,
    pub module: Option<String>,
    pub range: Option<Range>,
    pub variables: Vec<TraceVariable>,
}

/// An error reported by TLC, with its trace if one followed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: u32,
    pub lines: Vec<String>,
    pub trace: Vec<TraceState>,
}

impl ErrorInfo {
    /// Message text with blank lines removed.
    #[must_use]
    pub fn message(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.trim_end())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// The output ended while a structured message was still open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TruncatedOutput {
    /// Code of the unterminated message.
    pub code: u32,
    /// Lines received for it before the stream ended.
    pub buffered_lines: usize,
}

/// Kind of malformed marker sequence that was recovered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// END marker with no open message.
    UnmatchedEnd,
    /// END marker whose code differs from the open message.
    MismatchedEnd,
    /// START marker while another message was open; the open one was dropped.
    NestedStart,
}

/// A recovered protocol violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolViolation {
    pub kind: ViolationKind,
    /// Code carried by the offending marker.
    pub code: u32,
    /// 1-based line number in the output.
    pub line: usize,
}

/// Final state of a model checking run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelCheckResult {
    pub status: CheckStatus,
    pub success: bool,
    pub process: ProcessInfo,
    /// Progress reports in arrival order.
    pub progress: Vec<ProgressStats>,
    pub coverage: Vec<CoverageItem>,
    pub errors: Vec<ErrorInfo>,
    pub warnings: Vec<String>,
    pub diagnostics: DiagnosticCollection,
    pub truncated: Option<TruncatedOutput>,
}

impl ModelCheckResult {
    /// Latest progress report.
    #[must_use]
    pub fn last_progress(&self) -> Option<&ProgressStats> {
        self.progress.last()
    }

    /// Whether the run reached TLC's own end message.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.status == CheckStatus::Finished
    }
}
