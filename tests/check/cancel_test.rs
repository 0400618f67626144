use std::time::Duration;

use tlaplus_runner::check::CheckError;
use tlaplus_runner::output::{CheckStatus, OutputEvent};
use tlaplus_runner::process::ExitClass;

use super::{hang, workflow, SpecDir};

#[tokio::test]
async fn cancelled_check_reports_truncated_output() {
    let specs = SpecDir::new();
    let workflow = workflow();
    let mut run = workflow.check_model(specs.spec.clone(), &hang()).await.unwrap();

    // The second Starting status comes from TLC's own start message.
    let mut starts = 0;
    while starts < 2 {
        match run.next_event().await {
            Some(OutputEvent::Status {
                status: CheckStatus::Starting,
            }) => starts += 1,
            Some(_) => {}
            None => panic!("stream ended before TLC started"),
        }
    }
    run.cancel();

    let outcome = tokio::time::timeout(Duration::from_secs(10), run.wait())
        .await
        .expect("check stopped")
        .unwrap();
    assert!(outcome.cancelled);
    assert_eq!(outcome.exit, ExitClass::Terminated);
    let truncated = outcome.summary.truncated.expect("truncated");
    assert_eq!(truncated.code, 2200);
    assert!(!workflow.slot().is_busy());
}

#[tokio::test]
async fn cancel_through_slot_is_idempotent() {
    let specs = SpecDir::new();
    let workflow = workflow();
    let run = workflow.check_model(specs.spec.clone(), &hang()).await.unwrap();

    let active = workflow.slot().cancel_active().unwrap();
    assert_eq!(active.id, run.check().id);
    assert!(run.check().is_cancelled());
    run.cancel();

    let outcome = tokio::time::timeout(Duration::from_secs(10), run.wait())
        .await
        .expect("check stopped")
        .unwrap();
    assert!(outcome.cancelled);
    assert!(matches!(
        workflow.slot().cancel_active(),
        Err(CheckError::NotRunning)
    ));
}
