//! SANY plain-text output.
//!
//! SANY prints `Parsing file <path>` for every module it loads, then either
//! a `***Parse Error***` block or `*** Errors: N` / `*** Warnings: N`
//! sections made of location headings followed by message text.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;

use crate::diagnostic::{DiagnosticCollection, DiagnosticRecord, Position, Range, Severity};

use super::tlc::parse_location;
use super::OutputEvent;

fn parse_error_position_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"at line (\d+), column (\d+)").expect("valid parse error position regex")
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    ParseError,
    Messages(Severity),
}

#[derive(Debug)]
struct PendingMessage {
    file: PathBuf,
    range: Range,
    severity: Severity,
    lines: Vec<String>,
}

#[derive(Debug)]
pub(super) struct SanyHandler {
    tla_path: PathBuf,
    modules: HashMap<String, PathBuf>,
    current_file: PathBuf,
    section: Section,
    pending: Option<PendingMessage>,
    diagnostics: DiagnosticCollection,
}

impl SanyHandler {
    pub(super) fn new(tla_path: &Path) -> Self {
        Self {
            tla_path: tla_path.to_path_buf(),
            modules: HashMap::new(),
            current_file: tla_path.to_path_buf(),
            section: Section::None,
            pending: None,
            diagnostics: DiagnosticCollection::new(),
        }
    }

    pub(super) fn on_line(&mut self, line: &str, out: &mut Vec<OutputEvent>) {
        let trimmed = line.trim();

        if let Some(rest) = trimmed.strip_prefix("Parsing file ") {
            let path = self.resolve(Path::new(rest.split(" (").next().unwrap_or(rest)));
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                self.modules.insert(stem.to_string(), path.clone());
            }
            self.current_file = path;
            return;
        }
        if trimmed.starts_with("***Parse Error***") {
            self.flush(out);
            self.section = Section::ParseError;
            return;
        }
        if trimmed.starts_with("*** Errors:") {
            self.flush(out);
            self.section = Section::Messages(Severity::Error);
            return;
        }
        if trimmed.starts_with("*** Warnings:") {
            self.flush(out);
            self.section = Section::Messages(Severity::Warning);
            return;
        }
        if trimmed.starts_with("Fatal errors") {
            self.flush(out);
            self.section = Section::None;
            return;
        }

        match self.section {
            Section::None => {}
            Section::ParseError => self.on_parse_error_line(trimmed, out),
            Section::Messages(severity) => self.on_message_line(trimmed, severity, out),
        }
    }

    fn on_parse_error_line(&mut self, line: &str, out: &mut Vec<OutputEvent>) {
        let Some(caps) = parse_error_position_re().captures(line) else {
            return;
        };
        let (Ok(l), Ok(c)) = (caps[1].parse::<u32>(), caps[2].parse::<u32>()) else {
            return;
        };
        let record = DiagnosticRecord::new(
            self.current_file.clone(),
            Range::point(Position::from_one_based(l, c)),
            Severity::Error,
            line,
        );
        self.emit(record, out);
        self.section = Section::None;
    }

    fn on_message_line(&mut self, line: &str, severity: Severity, out: &mut Vec<OutputEvent>) {
        if line.starts_with("line ") {
            if let Some((module, range)) = parse_location(line) {
                self.flush(out);
                self.pending = Some(PendingMessage {
                    file: self.module_path(&module),
                    range,
                    severity,
                    lines: Vec::new(),
                });
                return;
            }
        }
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        if line.is_empty() {
            if !pending.lines.is_empty() {
                self.flush(out);
            }
        } else {
            pending.lines.push(line.to_string());
        }
    }

    fn flush(&mut self, out: &mut Vec<OutputEvent>) {
        let Some(pending) = self.pending.take() else {
            return;
        };
        if pending.lines.is_empty() {
            return;
        }
        let record = DiagnosticRecord::new(
            pending.file,
            pending.range,
            pending.severity,
            pending.lines.join("\n"),
        );
        self.emit(record, out);
    }

    fn emit(&mut self, record: DiagnosticRecord, out: &mut Vec<OutputEvent>) {
        if self.diagnostics.add(record.clone()) {
            out.push(OutputEvent::Diagnostic(record));
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        match self.tla_path.parent() {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }

    fn module_path(&self, module: &str) -> PathBuf {
        if let Some(path) = self.modules.get(module) {
            return path.clone();
        }
        match self.tla_path.parent() {
            Some(dir) => dir.join(format!("{module}.tla")),
            None => PathBuf::from(format!("{module}.tla")),
        }
    }

    /// Emit the message still being collected when the stream ends.
    pub(super) fn flush_pending(&mut self, out: &mut Vec<OutputEvent>) {
        self.flush(out);
    }

    pub(super) fn into_diagnostics(self) -> DiagnosticCollection {
        self.diagnostics
    }
}
