//! Interpretation of TLC `-tool` messages.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use regex::Regex;

use crate::diagnostic::{DiagnosticRecord, Position, Range, Severity};

use super::events::message_class;
use super::{
    CheckStatus, CoverageItem, ErrorInfo, ModelCheckResult, OutputEvent, ParsedMessage,
    ProgressStats, TraceState, TraceVariable,
};

/// TLC message codes the decoder understands.
pub mod codes {
    pub const GENERAL: u32 = 1000;
    pub const TLC_BEHAVIOR_UP_TO_THIS_POINT: u32 = 2121;
    pub const TLC_BACK_TO_STATE: u32 = 2122;
    pub const TLC_STARTING: u32 = 2185;
    pub const TLC_FINISHED: u32 = 2186;
    pub const TLC_MODE_MC: u32 = 2187;
    pub const TLC_COMPUTING_INIT: u32 = 2189;
    pub const TLC_INIT_GENERATED1: u32 = 2190;
    pub const TLC_SUCCESS: u32 = 2193;
    pub const TLC_SEARCH_DEPTH: u32 = 2194;
    pub const TLC_STATS: u32 = 2199;
    pub const TLC_PROGRESS_STATS: u32 = 2200;
    pub const TLC_COVERAGE_START: u32 = 2201;
    pub const TLC_COVERAGE_END: u32 = 2202;
    pub const TLC_STATE_PRINT1: u32 = 2216;
    pub const TLC_STATE_PRINT2: u32 = 2217;
    pub const TLC_STATE_PRINT3: u32 = 2218;
    pub const TLC_SANY_END: u32 = 2219;
    pub const TLC_SANY_START: u32 = 2220;
    pub const TLC_COVERAGE_VALUE: u32 = 2221;
    pub const TLC_VERSION: u32 = 2262;
    pub const TLC_COVERAGE_NEXT: u32 = 2772;
    pub const TLC_COVERAGE_INIT: u32 = 2773;
    pub const TLC_COVERAGE_PROPERTY: u32 = 2774;
    pub const TLC_COVERAGE_CONSTRAINT: u32 = 2775;
}

fn location_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"line (\d+), col(?:umn)? (\d+) to line (\d+), col(?:umn)? (\d+) of module (\w+)")
            .expect("valid location regex")
    })
}

fn progress_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"Progress\((\d+)\) at .*?: ([\d,]+) states generated(?: \(([\d,]+) s/min\))?, ([\d,]+) distinct states found(?: \(([\d,]+) ds/min\))?, ([\d,]+) states? left on queue",
        )
        .expect("valid progress regex")
    })
}

fn stats_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"([\d,]+) states? generated, ([\d,]+) distinct states? found, ([\d,]+) states? left on queue")
            .expect("valid stats regex")
    })
}

fn depth_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"search is (\d+)").expect("valid depth regex"))
}

fn workers_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"with (\d+) workers?").expect("valid workers regex"))
}

fn coverage_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^<(\w+) line (\d+), col (\d+) to line (\d+), col (\d+) of module (\w+)>: (\d+):(\d+)")
            .expect("valid coverage regex")
    })
}

fn timestamp_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\((\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2})\)").expect("valid timestamp regex")
    })
}

fn state_title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d+): (.*)$").expect("valid state title regex"))
}

/// Find a `line L, col C to line L2, col C2 of module M` location in text.
///
/// The returned range is zero-based with an exclusive end column.
pub(super) fn parse_location(text: &str) -> Option<(String, Range)> {
    let caps = location_re().captures(text)?;
    let num = |i: usize| caps[i].parse::<u32>().ok();
    let start = Position::from_one_based(num(1)?, num(2)?);
    let end = Position::new(num(3)?.saturating_sub(1), num(4)?);
    Some((caps[5].to_string(), Range::new(start, end)))
}

/// Read the `(YYYY-MM-DD HH:MM:SS)` stamp TLC appends to its start and finish
/// messages. TLC prints local time.
fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let caps = timestamp_re().captures(text)?;
    let naive = NaiveDateTime::parse_from_str(&caps[1], "%Y-%m-%d %H:%M:%S").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|t| t.with_timezone(&Utc))
}

fn parse_count(text: &str) -> u64 {
    text.replace(',', "").parse().unwrap_or(0)
}

fn parse_progress(text: &str) -> Option<ProgressStats> {
    let caps = progress_re().captures(text)?;
    Some(ProgressStats {
        depth: caps[1].parse().ok(),
        generated: parse_count(&caps[2]),
        generated_per_minute: caps.get(3).map(|m| parse_count(m.as_str())),
        distinct: parse_count(&caps[4]),
        distinct_per_minute: caps.get(5).map(|m| parse_count(m.as_str())),
        left: parse_count(&caps[6]),
    })
}

fn parse_stats(text: &str) -> Option<ProgressStats> {
    let caps = stats_re().captures(text)?;
    Some(ProgressStats {
        generated: parse_count(&caps[1]),
        distinct: parse_count(&caps[2]),
        left: parse_count(&caps[3]),
        ..ProgressStats::default()
    })
}

fn parse_coverage(line: &str) -> Option<CoverageItem> {
    let caps = coverage_re().captures(line.trim())?;
    let num = |i: usize| caps[i].parse::<u32>().ok();
    Some(CoverageItem {
        action: caps[1].to_string(),
        module: caps[6].to_string(),
        range: Range::new(
            Position::from_one_based(num(2)?, num(3)?),
            Position::new(num(4)?.saturating_sub(1), num(5)?),
        ),
        distinct: caps[7].parse().ok()?,
        total: caps[8].parse().ok()?,
    })
}

fn parse_trace_state(msg: &ParsedMessage) -> Option<TraceState> {
    let mut lines = msg.lines.iter().skip_while(|l| l.trim().is_empty());
    let caps = state_title_re().captures(lines.next()?.trim())?;
    let number = caps[1].parse().ok()?;
    let label = caps[2].trim();
    let label = label
        .strip_prefix('<')
        .and_then(|l| l.strip_suffix('>'))
        .unwrap_or(label);

    let (title, module, range) = match parse_location(label) {
        Some((module, range)) => {
            let title = label.split(" line ").next().unwrap_or(label).trim();
            (title.to_string(), Some(module), Some(range))
        }
        None => (label.to_string(), None, None),
    };

    let mut variables: Vec<TraceVariable> = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let assignment = line.trim_start().strip_prefix("/\\ ");
        let assignment = match assignment {
            Some(a) => Some(a),
            None if variables.is_empty() => Some(line.trim_start()),
            None => None,
        };
        match assignment.and_then(|a| a.split_once(" = ")) {
            Some((name, value)) => variables.push(TraceVariable {
                name: name.trim().to_string(),
                value: value.to_string(),
            }),
            None => {
                // Continuation of a multi-line value.
                if let Some(last) = variables.last_mut() {
                    last.value.push('\n');
                    last.value.push_str(line);
                }
            }
        }
    }

    Some(TraceState {
        number,
        title,
        module,
        range,
        variables,
    })
}

/// Accumulates a [`ModelCheckResult`] from TLC messages.
#[derive(Debug)]
pub(super) struct TlcHandler {
    tla_path: PathBuf,
    result: ModelCheckResult,
}

impl TlcHandler {
    pub(super) fn new(tla_path: &Path) -> Self {
        Self {
            tla_path: tla_path.to_path_buf(),
            result: ModelCheckResult::default(),
        }
    }

    pub(super) fn on_message(&mut self, msg: ParsedMessage, out: &mut Vec<OutputEvent>) {
        tracing::trace!(code = msg.code, class = msg.class(), "TLC message");
        match msg.code {
            codes::TLC_VERSION => {
                self.result.process.version = msg.first_line().map(str::to_string);
                self.set_status(CheckStatus::Starting, out);
            }
            codes::TLC_STARTING => {
                self.result.process.started_at =
                    Some(parse_timestamp(&msg.text()).unwrap_or_else(Utc::now));
                self.set_status(CheckStatus::Starting, out);
            }
            codes::TLC_MODE_MC => {
                let text = msg.text();
                self.result.process.workers = workers_re()
                    .captures(&text)
                    .and_then(|c| c[1].parse().ok());
                self.result.process.mode = msg.first_line().map(str::to_string);
            }
            codes::TLC_SANY_START => self.set_status(CheckStatus::SanyParsing, out),
            codes::TLC_SANY_END => {}
            codes::TLC_COMPUTING_INIT | codes::TLC_INIT_GENERATED1 => {
                self.set_status(CheckStatus::Checking, out);
            }
            codes::TLC_PROGRESS_STATS => {
                if let Some(stats) = parse_progress(&msg.text()) {
                    self.push_progress(stats, out);
                }
            }
            codes::TLC_STATS => {
                if let Some(stats) = parse_stats(&msg.text()) {
                    self.push_progress(stats, out);
                }
            }
            codes::TLC_SEARCH_DEPTH => {
                let depth = depth_re()
                    .captures(&msg.text())
                    .and_then(|c| c[1].parse().ok());
                if let (Some(depth), Some(last)) = (depth, self.result.progress.last_mut()) {
                    last.depth = Some(depth);
                }
            }
            codes::TLC_SUCCESS => self.result.success = true,
            codes::TLC_COVERAGE_START => self.result.coverage.clear(),
            codes::TLC_COVERAGE_INIT
            | codes::TLC_COVERAGE_NEXT
            | codes::TLC_COVERAGE_PROPERTY
            | codes::TLC_COVERAGE_CONSTRAINT => {
                self.result
                    .coverage
                    .extend(msg.lines.iter().filter_map(|l| parse_coverage(l)));
            }
            codes::TLC_COVERAGE_VALUE | codes::TLC_COVERAGE_END => {}
            codes::TLC_STATE_PRINT1
            | codes::TLC_STATE_PRINT2
            | codes::TLC_STATE_PRINT3
            | codes::TLC_BACK_TO_STATE => self.on_trace_state(&msg),
            codes::TLC_BEHAVIOR_UP_TO_THIS_POINT => {
                let error = self.current_error(msg.code);
                error.lines.extend(msg.lines);
            }
            codes::TLC_FINISHED => {
                self.result.process.finished_at =
                    Some(parse_timestamp(&msg.text()).unwrap_or_else(Utc::now));
                self.result.process.finish_text = msg.first_line().map(str::to_string);
                self.set_status(CheckStatus::Finished, out);
                out.push(OutputEvent::ResultFinalized(Box::new(self.result.clone())));
            }
            _ => self.on_classified(msg, out),
        }
    }

    fn on_classified(&mut self, msg: ParsedMessage, out: &mut Vec<OutputEvent>) {
        match msg.class() {
            message_class::ERROR | message_class::TLC_BUG => {
                let error = ErrorInfo {
                    code: msg.code,
                    lines: msg.lines,
                    trace: Vec::new(),
                };
                let text = error.message();
                if !text.is_empty() {
                    self.add_diagnostic(&text, Severity::Error, out);
                }
                self.result.errors.push(error);
            }
            message_class::WARNING => {
                let text = msg.text().trim().to_string();
                if parse_location(&text).is_some() {
                    self.add_diagnostic(&text, Severity::Warning, out);
                }
                self.result.warnings.push(text);
            }
            _ => tracing::debug!(code = msg.code, "Ignoring TLC message"),
        }
    }

    fn on_trace_state(&mut self, msg: &ParsedMessage) {
        match parse_trace_state(msg) {
            Some(state) => self.current_error(msg.code).trace.push(state),
            None => tracing::warn!(code = msg.code, "Unrecognized trace state"),
        }
    }

    /// Error that trace parts attach to, creating one if none was reported.
    fn current_error(&mut self, code: u32) -> &mut ErrorInfo {
        if self.result.errors.is_empty() {
            self.result.errors.push(ErrorInfo {
                code,
                lines: Vec::new(),
                trace: Vec::new(),
            });
        }
        let last = self.result.errors.len() - 1;
        &mut self.result.errors[last]
    }

    fn add_diagnostic(&mut self, text: &str, severity: Severity, out: &mut Vec<OutputEvent>) {
        let (file, range) = match parse_location(text) {
            Some((module, range)) => (self.module_path(&module), range),
            None => (self.tla_path.clone(), Range::default()),
        };
        let record = DiagnosticRecord::new(file, range, severity, text);
        if self.result.diagnostics.add(record.clone()) {
            out.push(OutputEvent::Diagnostic(record));
        }
    }

    fn module_path(&self, module: &str) -> PathBuf {
        match self.tla_path.parent() {
            Some(dir) => dir.join(format!("{module}.tla")),
            None => PathBuf::from(format!("{module}.tla")),
        }
    }

    fn set_status(&mut self, status: CheckStatus, out: &mut Vec<OutputEvent>) {
        if self.result.status != status {
            tracing::debug!(from = ?self.result.status, to = ?status, "Check status");
            self.result.status = status;
            out.push(OutputEvent::Status { status });
        }
    }

    fn push_progress(&mut self, stats: ProgressStats, out: &mut Vec<OutputEvent>) {
        self.result.progress.push(stats.clone());
        out.push(OutputEvent::Progress(stats));
    }

    pub(super) fn into_result(self) -> ModelCheckResult {
        self.result
    }
}
