use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tlaplus_runner::check::{CheckError, DebugFrontend};
use tlaplus_runner::config::ToolsConfig;
use tlaplus_runner::diagnostic::{MemoryDiagnostics, Severity};
use tlaplus_runner::output::{CheckStatus, OutputEvent};
use tlaplus_runner::process::{ExitClass, ToolError};

use super::{hang, workflow, workflow_with, SpecDir};

#[tokio::test]
async fn parse_module_applies_merged_diagnostics_once() {
    let specs = SpecDir::new();
    let workflow = workflow();
    let mut sink = MemoryDiagnostics::new();

    let outcome = workflow
        .parse_module(&specs.tla_path(), &mut sink)
        .await
        .unwrap();

    assert!(outcome.translated);
    assert_eq!(outcome.diagnostics.count(Severity::Error), 1);
    assert_eq!(sink.applications(), 1);
    let records = &sink.current()[&specs.tla_path()];
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].text, "Unknown operator: `bar'.");
    assert_eq!(records[0].range.start.line, 4);
    // SANY exits with 255 after listing its errors; its stderr is kept.
    assert_eq!(outcome.stderr, vec!["Picked up JAVA_TOOL_OPTIONS: -Xss4m"]);
}

#[tokio::test]
async fn check_model_streams_events_and_writes_out_file() {
    let specs = SpecDir::new();
    let workflow = workflow();

    let mut run = workflow.check_model(specs.spec.clone(), &[]).await.unwrap();
    assert!(workflow.slot().is_busy());

    let mut events = Vec::new();
    while let Some(event) = run.next_event().await {
        events.push(event);
    }
    let outcome = run.wait().await.unwrap();

    assert_eq!(outcome.exit, ExitClass::Success);
    assert!(!outcome.cancelled);
    assert!(!outcome.summary.is_truncated());
    let result = outcome.summary.model_check.unwrap();
    assert!(result.success);
    assert_eq!(result.status, CheckStatus::Finished);
    assert!(matches!(events.last(), Some(OutputEvent::ResultFinalized(_))));
    assert!(!workflow.slot().is_busy());

    let saved = std::fs::read_to_string(specs.spec.out_path()).unwrap();
    assert!(saved.contains("@!@!@STARTMSG 2185:0 @!@!@"));
    assert!(saved.contains("-config"));
}

#[tokio::test]
async fn out_file_can_be_disabled() {
    let specs = SpecDir::new();
    let workflow = workflow_with(ToolsConfig {
        create_out_files: false,
        ..ToolsConfig::default()
    });

    let run = workflow.check_model(specs.spec.clone(), &[]).await.unwrap();
    run.wait().await.unwrap();
    assert!(!specs.spec.out_path().exists());
}

#[tokio::test]
async fn configured_tlc_options_precede_user_args() {
    let specs = SpecDir::new();
    let workflow = workflow_with(ToolsConfig {
        tlc_options: "-workers 2".to_string(),
        ..ToolsConfig::default()
    });

    let run = workflow
        .check_model(specs.spec.clone(), &["-deadlock".to_string()])
        .await
        .unwrap();
    run.wait().await.unwrap();

    let saved = std::fs::read_to_string(specs.spec.out_path()).unwrap();
    assert!(saved.contains("-workers 2 -deadlock"));
}

#[tokio::test]
async fn violation_exit_code_keeps_decoded_result() {
    let specs = SpecDir::new();
    let workflow = workflow();

    let run = workflow
        .check_model(specs.spec.clone(), &["-violate".to_string()])
        .await
        .unwrap();
    let outcome = run.wait().await.unwrap();

    assert_eq!(outcome.exit, ExitClass::ToolingFailure(12));
    assert_eq!(
        outcome.stderr.as_deref(),
        Some("Picked up JAVA_TOOL_OPTIONS: -Xss4m")
    );
    let result = outcome.summary.model_check.unwrap();
    assert!(!result.success);
    assert_eq!(result.errors.len(), 1);
    assert!(result.errors[0].message().contains("TypeOK"));
}

#[tokio::test]
async fn launch_failure_is_an_error() {
    let specs = SpecDir::new();
    let workflow = workflow();

    let run = workflow
        .check_model(specs.spec.clone(), &["-crash".to_string()])
        .await
        .unwrap();
    let err = run.wait().await.unwrap_err();
    match err {
        CheckError::Tool(ToolError::ToolingFailure { code, stderr, .. }) => {
            assert_eq!(code, 75);
            assert!(stderr.contains("Could not find or load main class"));
        }
        e => panic!("unexpected error: {e}"),
    }
    assert!(!workflow.slot().is_busy());
}

#[tokio::test]
async fn crash_after_reported_error_is_a_tooling_failure() {
    let specs = SpecDir::new();
    let workflow = workflow();

    let run = workflow
        .check_model(specs.spec.clone(), &["-oom".to_string()])
        .await
        .unwrap();
    let err = run.wait().await.unwrap_err();
    match err {
        CheckError::Tool(ToolError::ToolingFailure { code, stderr, .. }) => {
            assert_eq!(code, 75);
            assert!(stderr.contains("java.lang.OutOfMemoryError"));
        }
        e => panic!("unexpected error: {e}"),
    }
    assert!(!workflow.slot().is_busy());
}

#[tokio::test]
async fn second_check_is_rejected_while_one_runs() {
    let specs = SpecDir::new();
    let other = SpecDir::new();
    let workflow = workflow();

    let run = workflow.check_model(specs.spec.clone(), &hang()).await.unwrap();
    let err = workflow
        .check_model(other.spec.clone(), &[])
        .await
        .unwrap_err();
    match err {
        CheckError::AlreadyRunning(active) => assert_eq!(active.id, run.check().id),
        e => panic!("unexpected error: {e}"),
    }

    run.cancel();
    let outcome = run.wait().await.unwrap();
    assert!(outcome.cancelled);
    assert!(!workflow.slot().is_busy());
}

#[derive(Default)]
struct RecordingFrontend {
    ports: Mutex<Vec<u16>>,
}

#[async_trait]
impl DebugFrontend for RecordingFrontend {
    async fn attach(&self, port: u16) -> std::io::Result<()> {
        self.ports.lock().unwrap().push(port);
        Ok(())
    }
}

struct RefusingFrontend;

#[async_trait]
impl DebugFrontend for RefusingFrontend {
    async fn attach(&self, _port: u16) -> std::io::Result<()> {
        Err(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "no debugger",
        ))
    }
}

#[tokio::test]
async fn check_and_debug_passes_port_to_tlc_and_frontend() {
    let specs = SpecDir::new();
    let workflow = workflow();
    let frontend = Arc::new(RecordingFrontend::default());

    let run = workflow
        .check_and_debug(specs.spec.clone(), &[], frontend.as_ref(), Duration::from_millis(10))
        .await
        .unwrap();
    run.wait().await.unwrap();

    let ports = frontend.ports.lock().unwrap().clone();
    assert_eq!(ports.len(), 1);
    let saved = std::fs::read_to_string(specs.spec.out_path()).unwrap();
    assert!(saved.contains(&format!("-debugger port={}", ports[0])));
}

#[tokio::test]
async fn failed_attach_stops_the_check() {
    let specs = SpecDir::new();
    let workflow = workflow();

    let err = workflow
        .check_and_debug(specs.spec.clone(), &hang(), &RefusingFrontend, Duration::ZERO)
        .await
        .unwrap_err();
    assert!(matches!(err, CheckError::Attach(_)));

    // The run task releases the slot once TLC has been interrupted.
    tokio::time::timeout(Duration::from_secs(10), async {
        while workflow.slot().is_busy() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .expect("slot released");
}
