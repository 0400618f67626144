//! Terminal rendering of decoded tool output.
//!
//! Events and diagnostics go to stdout with colored tags; echoed tool output
//! goes to stderr so `--json` output stays machine readable.

use std::io::{self, Write};

use chrono::Utc;
use owo_colors::OwoColorize;

use crate::diagnostic::{DiagnosticBatch, DiagnosticRecord, DiagnosticSink, Severity};
use crate::output::{
    CheckStatus, LineSink, ModelCheckResult, OutputEvent, ParseSummary, ProgressStats,
};
use crate::tools::ToolKind;

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Truncate a string to a maximum length, adding ellipsis if truncated.
#[must_use]
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let kept: String = s.chars().take(max_len - 3).collect();
        format!("{kept}...")
    }
}

/// `file:line:column`, 1-based like compiler output.
#[must_use]
pub fn format_location(record: &DiagnosticRecord) -> String {
    format!(
        "{}:{}:{}",
        record.file.display(),
        record.range.start.line + 1,
        record.range.start.column + 1
    )
}

/// Human-readable progress line.
#[must_use]
pub fn format_progress(stats: &ProgressStats) -> String {
    let mut text = format!(
        "{} states generated, {} distinct states found, {} states left on queue",
        stats.generated, stats.distinct, stats.left
    );
    if let Some(depth) = stats.depth {
        text.push_str(&format!(", depth {depth}"));
    }
    text
}

fn status_name(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::NotStarted => "not started",
        CheckStatus::Starting => "starting",
        CheckStatus::SanyParsing => "parsing",
        CheckStatus::Checking => "checking",
        CheckStatus::Finished => "finished",
    }
}

/// Print a diagnostic.
pub fn print_diagnostic(record: &DiagnosticRecord) {
    let location = format_location(record);
    let first = record.text.lines().next().unwrap_or_default();
    match record.severity {
        Severity::Error => println!("{} {} {}", "[ERROR]".red().bold(), location.bold(), first),
        Severity::Warning => println!(
            "{} {} {}",
            "[WARNING]".yellow().bold(),
            location.bold(),
            first
        ),
        Severity::Information | Severity::Hint => {
            println!("{} {} {}", "[INFO]".blue().bold(), location.bold(), first);
        }
    }
    for line in record.text.lines().skip(1) {
        println!("    {}", line.dimmed());
    }
    let _ = io::stdout().flush();
}

/// Print a status change.
pub fn print_status(status: CheckStatus) {
    println!(
        "{} {} {}",
        timestamp().dimmed(),
        "[TLC]".cyan().bold(),
        status_name(status)
    );
    let _ = io::stdout().flush();
}

/// Print a progress report.
pub fn print_progress(stats: &ProgressStats) {
    println!(
        "{} {} {}",
        timestamp().dimmed(),
        "[PROGRESS]".magenta().bold(),
        format_progress(stats)
    );
    let _ = io::stdout().flush();
}

/// Print the final model checking result.
pub fn print_result(result: &ModelCheckResult) {
    let ts = timestamp();
    if result.success {
        println!(
            "{} {} {}",
            ts.dimmed(),
            "[RESULT]".green().bold(),
            "No error has been found".green()
        );
    } else if result.errors.is_empty() {
        println!(
            "{} {} Model checking finished without a verdict",
            ts.dimmed(),
            "[RESULT]".yellow().bold()
        );
    } else {
        println!(
            "{} {} {} error(s) found",
            ts.dimmed(),
            "[RESULT]".red().bold(),
            result.errors.len()
        );
        for error in &result.errors {
            println!("{} {}", "[ERROR]".red().bold(), truncate(&error.message(), 200));
            if !error.trace.is_empty() {
                println!("    {} {} states", "trace:".dimmed(), error.trace.len());
            }
        }
    }
    if let Some(last) = result.last_progress() {
        println!("    {}", format_progress(last).dimmed());
    }
    let _ = io::stdout().flush();
}

/// Print one decoded event.
pub fn print_event(event: &OutputEvent) {
    match event {
        OutputEvent::Diagnostic(record) => print_diagnostic(record),
        OutputEvent::Status { status } => print_status(*status),
        OutputEvent::Progress(stats) => print_progress(stats),
        OutputEvent::ResultFinalized(result) => print_result(result),
    }
}

/// Print an event as a JSON line.
pub fn print_event_json(event: &OutputEvent) {
    match serde_json::to_string(event) {
        Ok(json) => println!("{json}"),
        Err(e) => tracing::warn!(error = %e, "Cannot serialize event"),
    }
    let _ = io::stdout().flush();
}

/// Print warnings about how the output stream ended.
pub fn print_stream_warnings(summary: &ParseSummary) {
    if let Some(truncated) = &summary.truncated {
        println!(
            "{} Output of {} ended inside message {} ({} buffered lines); the run did not finish cleanly",
            "[WARNING]".yellow().bold(),
            summary.kind,
            truncated.code,
            truncated.buffered_lines
        );
    }
    if !summary.protocol_violations.is_empty() {
        println!(
            "{} {} malformed message marker(s) in {} output",
            "[WARNING]".yellow().bold(),
            summary.protocol_violations.len(),
            summary.kind
        );
    }
    let _ = io::stdout().flush();
}

/// Print an error message.
pub fn print_error(message: &str) {
    println!("{} {}", "[ERROR]".red().bold(), message);
    let _ = io::stdout().flush();
}

/// Print what a tool wrote to stderr before exiting with a failure code.
pub fn print_tool_stderr(stderr: &str) {
    println!("{} Tool error output:", "[ERROR]".red().bold());
    for line in stderr.lines() {
        println!("    {line}");
    }
    let _ = io::stdout().flush();
}

/// Print an informational message.
pub fn print_info(message: &str) {
    println!("{} {}", "[INFO]".blue().bold(), message);
    let _ = io::stdout().flush();
}

/// Echoes a tool's passthrough output to stderr, tagged with the tool name.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleEcho {
    kind: ToolKind,
}

impl ConsoleEcho {
    #[must_use]
    pub fn new(kind: ToolKind) -> Self {
        Self { kind }
    }
}

impl LineSink for ConsoleEcho {
    fn line(&mut self, line: &str) {
        eprintln!("{} {}", format!("[{}]", self.kind).dimmed(), line);
    }
}

/// Prints every applied batch to the terminal.
#[derive(Debug, Default)]
pub struct ConsoleDiagnostics;

impl DiagnosticSink for ConsoleDiagnostics {
    fn replace_all(&mut self, batch: DiagnosticBatch) {
        for record in batch.values().flatten() {
            print_diagnostic(record);
        }
    }
}
