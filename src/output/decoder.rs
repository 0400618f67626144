//! Line-level state machine over tool output.

use std::path::Path;

use crate::tools::ToolKind;

use super::pluscal::PlusCalHandler;
use super::sany::SanyHandler;
use super::tlc::TlcHandler;
use super::{
    parse_marker, strip_markers, LineSink, Marker, OutputEvent, ParseSummary, ParsedMessage,
    ProtocolViolation, TruncatedOutput, ViolationKind,
};

/// Decoder state between lines.
#[derive(Debug)]
enum DecoderState {
    Passthrough,
    InMessage(ParsedMessage),
}

#[derive(Debug)]
enum Handler {
    Transpiler(PlusCalHandler),
    Analyzer(SanyHandler),
    ModelChecker(TlcHandler),
}

impl Handler {
    fn new(kind: ToolKind, tla_path: &Path) -> Self {
        match kind {
            ToolKind::Transpiler => Self::Transpiler(PlusCalHandler::new(tla_path)),
            ToolKind::Analyzer => Self::Analyzer(SanyHandler::new(tla_path)),
            ToolKind::ModelChecker => Self::ModelChecker(TlcHandler::new(tla_path)),
        }
    }

    fn on_text(&mut self, line: &str, out: &mut Vec<OutputEvent>) {
        match self {
            Self::Transpiler(h) => h.on_line(line, out),
            Self::Analyzer(h) => h.on_line(line, out),
            // TLC in -tool mode puts everything meaningful inside messages.
            Self::ModelChecker(_) => {}
        }
    }

    fn on_message(&mut self, msg: ParsedMessage, out: &mut Vec<OutputEvent>) {
        match self {
            Self::ModelChecker(h) => h.on_message(msg, out),
            Self::Transpiler(_) | Self::Analyzer(_) => {
                tracing::debug!(code = msg.code, "Unexpected structured message");
            }
        }
    }

    fn flush_pending(&mut self, out: &mut Vec<OutputEvent>) {
        match self {
            Self::Transpiler(h) => h.flush_pending(out),
            Self::Analyzer(h) => h.flush_pending(out),
            Self::ModelChecker(_) => {}
        }
    }
}

/// Decodes one tool run's stdout, one line at a time.
///
/// Single use: after [`OutputDecoder::end_of_stream`] further lines are
/// ignored, and [`OutputDecoder::finish`] consumes the decoder.
pub struct OutputDecoder {
    kind: ToolKind,
    state: DecoderState,
    handler: Handler,
    line_no: usize,
    ended: bool,
    truncated: Option<TruncatedOutput>,
    violations: Vec<ProtocolViolation>,
    echo: Option<Box<dyn LineSink>>,
    mirror: Option<Box<dyn LineSink>>,
}

impl OutputDecoder {
    /// Create a decoder for the given tool. `tla_path` is the module the
    /// tool was run on; relative module references resolve next to it.
    #[must_use]
    pub fn new(kind: ToolKind, tla_path: &Path) -> Self {
        Self {
            kind,
            state: DecoderState::Passthrough,
            handler: Handler::new(kind, tla_path),
            line_no: 0,
            ended: false,
            truncated: None,
            violations: Vec::new(),
            echo: None,
            mirror: None,
        }
    }

    /// Forward non-sentinel lines, with markers stripped, to a console sink.
    #[must_use]
    pub fn with_echo(mut self, sink: impl LineSink + 'static) -> Self {
        self.echo = Some(Box::new(sink));
        self
    }

    /// Forward every raw line unchanged, e.g. to an `.out` file.
    #[must_use]
    pub fn with_mirror(mut self, sink: impl LineSink + 'static) -> Self {
        self.mirror = Some(Box::new(sink));
        self
    }

    #[must_use]
    pub fn kind(&self) -> ToolKind {
        self.kind
    }

    /// Whether a structured message is currently open.
    #[must_use]
    pub fn in_message(&self) -> bool {
        matches!(self.state, DecoderState::InMessage(_))
    }

    /// Consume one line (without its terminator) and return the events it
    /// completes, in order.
    pub fn feed_line(&mut self, line: &str) -> Vec<OutputEvent> {
        let mut out = Vec::new();
        if self.ended {
            tracing::warn!(kind = %self.kind, "Line received after end of stream");
            return out;
        }
        self.line_no += 1;
        if let Some(mirror) = self.mirror.as_mut() {
            mirror.line(line);
        }

        match parse_marker(line) {
            Some(Marker::Start { code, sub_code }) => {
                let next = DecoderState::InMessage(ParsedMessage {
                    code,
                    sub_code,
                    lines: Vec::new(),
                });
                if let DecoderState::InMessage(open) = std::mem::replace(&mut self.state, next) {
                    self.violation(ViolationKind::NestedStart, open.code);
                }
            }
            Some(Marker::End { code }) => {
                match std::mem::replace(&mut self.state, DecoderState::Passthrough) {
                    DecoderState::InMessage(msg) if msg.code == code => {
                        self.handler.on_message(msg, &mut out);
                    }
                    DecoderState::InMessage(mut msg) => {
                        // The stray marker stays part of the body.
                        msg.lines.push(line.to_string());
                        self.state = DecoderState::InMessage(msg);
                        self.violation(ViolationKind::MismatchedEnd, code);
                    }
                    DecoderState::Passthrough => self.violation(ViolationKind::UnmatchedEnd, code),
                }
            }
            None => {
                if let (Some(echo), Some(clean)) = (self.echo.as_mut(), strip_markers(line)) {
                    echo.line(&clean);
                }
                match &mut self.state {
                    DecoderState::InMessage(msg) => msg.lines.push(line.to_string()),
                    DecoderState::Passthrough => self.handler.on_text(line, &mut out),
                }
            }
        }
        out
    }

    /// Mark the end of the stream (natural or after cancellation).
    ///
    /// An open message is dropped and recorded as truncated output. Returns
    /// any events the handlers were still holding back. Idempotent.
    pub fn end_of_stream(&mut self) -> Vec<OutputEvent> {
        let mut out = Vec::new();
        if self.ended {
            return out;
        }
        self.ended = true;

        if let DecoderState::InMessage(msg) =
            std::mem::replace(&mut self.state, DecoderState::Passthrough)
        {
            tracing::warn!(
                kind = %self.kind,
                code = msg.code,
                buffered_lines = msg.lines.len(),
                "Output ended inside a message"
            );
            self.truncated = Some(TruncatedOutput {
                code: msg.code,
                buffered_lines: msg.lines.len(),
            });
        }
        self.handler.flush_pending(&mut out);
        if let Some(echo) = self.echo.as_mut() {
            echo.close();
        }
        if let Some(mirror) = self.mirror.as_mut() {
            mirror.close();
        }
        out
    }

    /// Build the final aggregate, ending the stream first if needed.
    #[must_use]
    pub fn finish(mut self) -> ParseSummary {
        // Events from a late end are already part of the aggregates.
        let _ = self.end_of_stream();

        let truncated = self.truncated;
        let (diagnostics, model_check, translated) = match self.handler {
            Handler::Transpiler(h) => {
                let (diagnostics, translated) = h.into_parts();
                (diagnostics, None, translated)
            }
            Handler::Analyzer(h) => (h.into_diagnostics(), None, false),
            Handler::ModelChecker(h) => {
                let mut result = h.into_result();
                result.truncated.clone_from(&truncated);
                (result.diagnostics.clone(), Some(result), false)
            }
        };

        tracing::debug!(
            kind = %self.kind,
            lines = self.line_no,
            diagnostics = diagnostics.len(),
            truncated = truncated.is_some(),
            violations = self.violations.len(),
            "Output decoded"
        );

        ParseSummary {
            kind: self.kind,
            diagnostics,
            model_check,
            translated,
            truncated,
            protocol_violations: self.violations,
        }
    }

    fn violation(&mut self, kind: ViolationKind, code: u32) {
        tracing::warn!(
            tool = %self.kind,
            violation = ?kind,
            code,
            line = self.line_no,
            "Malformed message markers"
        );
        self.violations.push(ProtocolViolation {
            kind,
            code,
            line: self.line_no,
        });
    }
}
