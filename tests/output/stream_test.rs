//! Tests for incremental decoding of a live stream.

use std::path::Path;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tlaplus_runner::output::{
    OutFile, OutputDecoder, OutputEvent, OutputParser, SharedLines, StreamError,
};
use tlaplus_runner::tools::ToolKind;

fn tlc_decoder() -> OutputDecoder {
    OutputDecoder::new(ToolKind::ModelChecker, Path::new("/specs/Foo.tla"))
}

#[tokio::test]
async fn complete_then_unterminated_message_reports_truncation() {
    let input = concat!(
        "@!@!@STARTMSG 2189:0 @!@!@\n",
        "Computing initial states...\n",
        "@!@!@ENDMSG 2189 @!@!@\n",
        "@!@!@STARTMSG 2200:0 @!@!@\n",
        "Progress(3) at 2024-03-01 10:00:05: 1,024 states generated, 512 distinct states found, 12 states left on queue.\n",
    );
    let parser = OutputParser::new(input.as_bytes(), tlc_decoder());

    let mut events = Vec::new();
    let summary = parser.read_all_with(|e| events.push(e)).await.unwrap();

    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], OutputEvent::Status { .. }));
    let truncated = summary.truncated.expect("truncated output");
    assert_eq!(truncated.code, 2200);
    assert_eq!(truncated.buffered_lines, 1);
    assert!(summary.model_check.unwrap().progress.is_empty());
}

#[tokio::test]
async fn events_arrive_before_stream_ends() {
    let (mut writer, reader) = tokio::io::duplex(4096);
    let mut parser = OutputParser::new(reader, tlc_decoder());

    writer
        .write_all(b"@!@!@STARTMSG 2185:0 @!@!@\nStarting...\n@!@!@ENDMSG 2185 @!@!@\n")
        .await
        .unwrap();
    let first = tokio::time::timeout(Duration::from_secs(5), parser.next_event())
        .await
        .expect("event before end of stream")
        .unwrap();
    assert!(matches!(first, Some(OutputEvent::Status { .. })));

    drop(writer);
    assert!(parser.next_event().await.unwrap().is_none());
    assert!(!parser.finish().is_truncated());
}

#[tokio::test]
async fn echo_and_out_file_receive_lines() {
    let dir = tempfile::tempdir().unwrap();
    let out_path = dir.path().join("Foo.out");
    let echo = SharedLines::new();
    let decoder = tlc_decoder()
        .with_echo(echo.clone())
        .with_mirror(OutFile::create(&out_path).unwrap());

    let input = concat!(
        "TLC2 Version 2.18\n",
        "@!@!@STARTMSG 2185:0 @!@!@\n",
        "Starting...\n",
        "@!@!@ENDMSG 2185 @!@!@\n",
    );
    let summary = OutputParser::new(input.as_bytes(), decoder)
        .read_all()
        .await
        .unwrap();
    assert!(!summary.is_truncated());

    assert_eq!(echo.lines(), vec!["TLC2 Version 2.18", "Starting..."]);
    let saved = std::fs::read_to_string(&out_path).unwrap();
    assert_eq!(saved, input);
}

#[tokio::test]
async fn read_error_is_reported() {
    let reader = tokio_test::io::Builder::new()
        .read(b"@!@!@STARTMSG 2185:0 @!@!@\n")
        .read_error(std::io::Error::new(std::io::ErrorKind::Other, "pipe closed"))
        .build();
    let parser = OutputParser::new(reader, tlc_decoder());

    let err = parser.read_all().await.unwrap_err();
    assert!(matches!(err, StreamError::Io(_)));
}

#[tokio::test]
async fn invalid_utf8_does_not_stop_decoding() {
    let input: &'static [u8] = b"@!@!@STARTMSG 2110:1 @!@!@\n\
Invariant Inv is violated by x = \"caf\xe9\".\n\
@!@!@ENDMSG 2110 @!@!@\n\
@!@!@STARTMSG 2186:0 @!@!@\n\
Finished in 01s at (2024-03-01 10:00:01)\n\
@!@!@ENDMSG 2186 @!@!@\n";

    let summary = OutputParser::new(input, tlc_decoder()).read_all().await.unwrap();

    let result = summary.model_check.unwrap();
    assert!(result.is_finished());
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].message().contains("caf\u{FFFD}"));
}
