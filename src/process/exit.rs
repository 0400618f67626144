//! Classification of tool exit statuses.

use std::process::ExitStatus;

use serde::Serialize;

/// Highest exit code the tools use to report problems in the checked spec.
const LAST_TOOL_REPORTED_CODE: i32 = 9;

/// How a tool process ended.
///
/// Codes `1..=9` mean the tool ran and reported a problem through its own
/// output. Anything above that comes from the launcher or the JVM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "class", content = "code")]
pub enum ExitClass {
    Success,
    ToolReportedIssue(i32),
    ToolingFailure(i32),
    /// Killed by a signal, or exited after being interrupted.
    Terminated,
}

impl ExitClass {
    #[must_use]
    pub fn classify(status: ExitStatus) -> Self {
        Self::from_code(status.code())
    }

    #[must_use]
    pub fn from_code(code: Option<i32>) -> Self {
        match code {
            None => Self::Terminated,
            Some(0) => Self::Success,
            Some(c) if (1..=LAST_TOOL_REPORTED_CODE).contains(&c) => Self::ToolReportedIssue(c),
            Some(c) => Self::ToolingFailure(c),
        }
    }

    #[must_use]
    pub fn is_failure(self) -> bool {
        matches!(self, Self::ToolingFailure(_))
    }
}
