//! Tests for decoding complete tool transcripts.

use std::path::Path;

use tlaplus_runner::diagnostic::{apply, merge, MemoryDiagnostics, Severity};
use tlaplus_runner::output::{
    CheckStatus, OutputDecoder, OutputEvent, ParseSummary, ViolationKind,
};
use tlaplus_runner::tools::ToolKind;

fn decode(kind: ToolKind, transcript: &str) -> (Vec<OutputEvent>, ParseSummary) {
    let mut decoder = OutputDecoder::new(kind, Path::new("/specs/Queue.tla"));
    let mut events = Vec::new();
    for line in transcript.lines() {
        events.extend(decoder.feed_line(line));
    }
    events.extend(decoder.end_of_stream());
    (events, decoder.finish())
}

const INVARIANT_VIOLATION: &str = "\
@!@!@STARTMSG 2262:0 @!@!@
TLC2 Version 2.18 of 20 March 2023 (rev: 3ea3222)
@!@!@ENDMSG 2262 @!@!@
@!@!@STARTMSG 2187:0 @!@!@
Running breadth-first search Model-Checking with fp 86 and seed -5755320172003082571 with 4 workers on 8 cores with 3641MB heap and 64MB offheap memory [pid: 1234] (Linux 6.1.0 amd64, Ubuntu 17.0.2 x86_64, MSBDiskFPSet, DiskStateQueue).
@!@!@ENDMSG 2187 @!@!@
@!@!@STARTMSG 2220:0 @!@!@
Starting SANY...
@!@!@ENDMSG 2220 @!@!@
Parsing file /specs/Queue.tla
Semantic processing of module Queue
@!@!@STARTMSG 2219:0 @!@!@
SANY finished.
@!@!@ENDMSG 2219 @!@!@
@!@!@STARTMSG 2185:0 @!@!@
Starting... (2024-03-01 10:00:00)
@!@!@ENDMSG 2185 @!@!@
@!@!@STARTMSG 2189:0 @!@!@
Computing initial states...
@!@!@ENDMSG 2189 @!@!@
@!@!@STARTMSG 2110:1 @!@!@
Invariant TypeOK is violated.
@!@!@ENDMSG 2110 @!@!@
@!@!@STARTMSG 2121:1 @!@!@
The behavior up to this point is:
@!@!@ENDMSG 2121 @!@!@
@!@!@STARTMSG 2217:4 @!@!@
1: <Initial predicate>
/\\ queue = <<>>
/\\ count = 0

@!@!@ENDMSG 2217 @!@!@
@!@!@STARTMSG 2217:4 @!@!@
2: <Enqueue line 12, col 5 to line 14, col 20 of module Queue>
/\\ queue = <<1>>
/\\ count = -1

@!@!@ENDMSG 2217 @!@!@
@!@!@STARTMSG 2199:0 @!@!@
3 states generated, 2 distinct states found, 0 states left on queue.
@!@!@ENDMSG 2199 @!@!@
@!@!@STARTMSG 2194:0 @!@!@
The depth of the complete state graph search is 2.
@!@!@ENDMSG 2194 @!@!@
@!@!@STARTMSG 2186:0 @!@!@
Finished in 01s at (2024-03-01 10:00:01)
@!@!@ENDMSG 2186 @!@!@
";

#[test]
fn invariant_violation_transcript() {
    let (events, summary) = decode(ToolKind::ModelChecker, INVARIANT_VIOLATION);

    let statuses: Vec<CheckStatus> = events
        .iter()
        .filter_map(|e| match e {
            OutputEvent::Status { status } => Some(*status),
            _ => None,
        })
        .collect();
    assert_eq!(
        statuses,
        vec![
            CheckStatus::Starting,
            CheckStatus::SanyParsing,
            CheckStatus::Starting,
            CheckStatus::Checking,
            CheckStatus::Finished
        ]
    );
    assert!(events.last().unwrap().is_terminal());

    let result = summary.model_check.expect("model check result");
    assert!(!result.success);
    assert!(result.is_finished());
    assert_eq!(result.process.workers, Some(4));
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].message().contains("TypeOK"));
    assert_eq!(result.errors[0].trace.len(), 2);
    assert_eq!(result.errors[0].trace[1].variables[1].value, "-1");
    assert!(summary.truncated.is_none());
    assert!(summary.protocol_violations.is_empty());
}

#[test]
fn stray_and_nested_markers_are_recovered() {
    let transcript = "\
@!@!@ENDMSG 2185 @!@!@
@!@!@STARTMSG 2185:0 @!@!@
Starting...
@!@!@STARTMSG 2220:0 @!@!@
Starting SANY...
@!@!@ENDMSG 2220 @!@!@
";
    let (events, summary) = decode(ToolKind::ModelChecker, transcript);
    let kinds: Vec<ViolationKind> = summary.protocol_violations.iter().map(|v| v.kind).collect();
    assert_eq!(kinds, vec![ViolationKind::UnmatchedEnd, ViolationKind::NestedStart]);
    assert_eq!(events.len(), 1);
    assert!(summary.truncated.is_none());
}

#[test]
fn parse_module_diagnostics_merge_and_apply() {
    let (_, pluscal) = decode(
        ToolKind::Transpiler,
        "Unrecoverable error:\n -- Missing `;' before `end'\n    line 20, column 3.\n",
    );
    let (_, sany) = decode(
        ToolKind::Analyzer,
        "\
Parsing file /specs/Queue.tla
*** Errors: 1

line 30, col 1 to line 30, col 6 of module Queue

Unknown operator: `Foo'.

",
    );

    let merged = merge([pluscal.diagnostics, sany.diagnostics]);
    assert_eq!(merged.count(Severity::Error), 2);

    let mut sink = MemoryDiagnostics::new();
    apply(merged, &mut sink);
    assert_eq!(sink.applications(), 1);
    let records = &sink.current()[Path::new("/specs/Queue.tla")];
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].range.start.line, 19);
    assert_eq!(records[1].range.start.line, 29);
}

#[test]
fn pluscal_position_inside_message_is_reported() {
    let (_, summary) = decode(
        ToolKind::Transpiler,
        "\
pcal.trans Version 1.11 of 31 December 2020
Parsing completed.
Unrecoverable error:
 -- Process proc redefined at line 10, column 1.
",
    );
    assert_eq!(summary.diagnostics.count(Severity::Error), 1);
    let records = summary.diagnostics.get(Path::new("/specs/Queue.tla"));
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].range.start.line, 9);
    assert_eq!(records[0].range.start.column, 0);
    assert!(records[0].text.contains("Process proc redefined"));
}
