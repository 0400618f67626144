//! PlusCal translator plain-text output.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::diagnostic::{DiagnosticCollection, DiagnosticRecord, Position, Range, Severity};

use super::OutputEvent;

/// A position mentioned inside message text.
fn position_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"line (\d+), column (\d+)").expect("valid position regex"))
}

/// A line that holds nothing but the error position.
fn position_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^line (\d+), column (\d+)\.?$").expect("valid position line regex")
    })
}

fn position_in(re: &Regex, text: &str) -> Option<Position> {
    let caps = re.captures(text)?;
    let line = caps[1].parse::<u32>().ok()?;
    let column = caps[2].parse::<u32>().ok()?;
    Some(Position::from_one_based(line, column))
}

#[derive(Debug, Default)]
struct PendingError {
    text: Vec<String>,
    position: Option<Position>,
}

#[derive(Debug)]
pub(super) struct PlusCalHandler {
    tla_path: PathBuf,
    pending: Option<PendingError>,
    translated: bool,
    diagnostics: DiagnosticCollection,
}

impl PlusCalHandler {
    pub(super) fn new(tla_path: &Path) -> Self {
        Self {
            tla_path: tla_path.to_path_buf(),
            pending: None,
            translated: false,
            diagnostics: DiagnosticCollection::new(),
        }
    }

    pub(super) fn on_line(&mut self, line: &str, out: &mut Vec<OutputEvent>) {
        let trimmed = line.trim();
        if trimmed.starts_with("Translation completed") {
            self.translated = true;
            return;
        }
        if trimmed.starts_with("Unrecoverable error") {
            self.flush(out);
            self.pending = Some(PendingError::default());
            return;
        }
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        if let Some(text) = trimmed.strip_prefix("--") {
            let text = text.trim();
            if pending.position.is_none() {
                pending.position = position_in(position_re(), text);
            }
            pending.text.push(text.to_string());
            return;
        }
        if let Some(position) = position_in(position_line_re(), trimmed) {
            pending.position = Some(position);
            self.flush(out);
            return;
        }
        if !trimmed.is_empty() && !pending.text.is_empty() {
            pending.text.push(trimmed.to_string());
        }
    }

    fn flush(&mut self, out: &mut Vec<OutputEvent>) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        if pending.text.is_empty() {
            return;
        }
        let range = Range::point(pending.position.unwrap_or_default());
        let record = DiagnosticRecord::new(
            self.tla_path.clone(),
            range,
            Severity::Error,
            pending.text.join("\n"),
        );
        if self.diagnostics.add(record.clone()) {
            out.push(OutputEvent::Diagnostic(record));
        }
    }

    /// Emit an error whose position line never arrived.
    pub(super) fn flush_pending(&mut self, out: &mut Vec<OutputEvent>) {
        self.flush(out);
    }

    pub(super) fn into_parts(self) -> (DiagnosticCollection, bool) {
        (self.diagnostics, self.translated)
    }
}
