use std::path::Path;
use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

use crate::diagnostic::{apply, merge, DiagnosticCollection, DiagnosticSink};
use crate::output::{
    LineSink, ModelCheckResult, OutFile, OutputDecoder, OutputEvent, OutputParser,
    ParseSummary, DEFAULT_CHANNEL_BUFFER,
};
use crate::process::{ExitClass, ToolError, ToolRunner};
use crate::tools::{SpecFiles, ToolKind};

use super::{ActiveCheck, CheckError, CheckSlot};

/// Builds a console sink for one tool's passthrough output.
pub type EchoFactory = Arc<dyn Fn(ToolKind) -> Box<dyn LineSink> + Send + Sync>;

/// Outcome of translating and parsing one module.
#[derive(Debug, Clone)]
pub struct ParseOutcome {
    /// Whether the PlusCal translator rewrote the module.
    pub translated: bool,
    /// Everything that was applied to the sink.
    pub diagnostics: DiagnosticCollection,
    /// stderr of tools that exited with a failure code after reporting
    /// diagnostics.
    pub stderr: Vec<String>,
}

/// Outcome of a finished model check.
#[derive(Debug)]
pub struct CheckOutcome {
    pub summary: ParseSummary,
    pub exit: ExitClass,
    /// TLC's stderr when it exited with a failure code after finishing.
    pub stderr: Option<String>,
    pub cancelled: bool,
}

/// Runs the tools on behalf of a caller.
pub struct Workflow {
    runner: ToolRunner,
    slot: CheckSlot,
    echo: Option<EchoFactory>,
}

impl Workflow {
    #[must_use]
    pub fn new(runner: ToolRunner) -> Self {
        Self {
            runner,
            slot: CheckSlot::new(),
            echo: None,
        }
    }

    /// Share an existing slot, e.g. with another front end.
    #[must_use]
    pub fn with_slot(mut self, slot: CheckSlot) -> Self {
        self.slot = slot;
        self
    }

    /// Echo passthrough output of every run to sinks made by `factory`.
    #[must_use]
    pub fn with_echo(mut self, factory: EchoFactory) -> Self {
        self.echo = Some(factory);
        self
    }

    #[must_use]
    pub fn runner(&self) -> &ToolRunner {
        &self.runner
    }

    #[must_use]
    pub fn slot(&self) -> &CheckSlot {
        &self.slot
    }

    fn decoder(&self, kind: ToolKind, spec: &SpecFiles) -> OutputDecoder {
        let decoder = OutputDecoder::new(kind, spec.tla_path());
        match &self.echo {
            Some(factory) => decoder.with_echo(factory(kind)),
            None => decoder,
        }
    }

    /// Run a tool to completion and decode its whole output.
    async fn run_to_end(
        &self,
        kind: ToolKind,
        spec: &SpecFiles,
        user_args: &[String],
    ) -> Result<(ParseSummary, Option<String>), CheckError> {
        let mut process = self.runner.run(kind, spec, user_args).await?;
        let stdout = process.take_stdout().ok_or(ToolError::NoStdout)?;
        let summary = OutputParser::new(stdout, self.decoder(kind, spec))
            .read_all()
            .await?;
        let (exit, stderr) = settle_exit(process.wait_exit().await, &summary)?;
        tracing::debug!(
            tool = %kind,
            ?exit,
            diagnostics = summary.diagnostics.len(),
            "Tool run finished"
        );
        Ok((summary, stderr))
    }

    /// Translate PlusCal in `tla_path`, then parse the result with SANY, and
    /// publish the combined diagnostics to `sink` in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if either tool cannot be run. The sink is left
    /// untouched in that case.
    pub async fn parse_module(
        &self,
        tla_path: &Path,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<ParseOutcome, CheckError> {
        let spec = SpecFiles::new(tla_path, tla_path.with_extension("cfg"))
            .map_err(ToolError::from)?;

        let pluscal_args = self.runner.configured_options(ToolKind::Transpiler);
        let (transpiled, pluscal_stderr) = self
            .run_to_end(ToolKind::Transpiler, &spec, &pluscal_args)
            .await?;
        let (analyzed, sany_stderr) = self.run_to_end(ToolKind::Analyzer, &spec, &[]).await?;

        let diagnostics = merge([transpiled.diagnostics, analyzed.diagnostics]);
        apply(diagnostics.clone(), sink);
        Ok(ParseOutcome {
            translated: transpiled.translated,
            diagnostics,
            stderr: pluscal_stderr.into_iter().chain(sany_stderr).collect(),
        })
    }

    /// Start TLC on `spec`.
    ///
    /// Configured TLC options come first, then `user_args`. Events are
    /// delivered through the returned [`CheckRun`] while the check runs.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::AlreadyRunning` if another check holds the slot,
    /// or an error if TLC cannot be started.
    pub async fn check_model(
        &self,
        spec: SpecFiles,
        user_args: &[String],
    ) -> Result<CheckRun, CheckError> {
        let guard = self.slot.try_acquire(spec.clone())?;

        let mut args = self.runner.configured_options(ToolKind::ModelChecker);
        args.extend_from_slice(user_args);
        let mut process = self.runner.run(ToolKind::ModelChecker, &spec, &args).await?;
        let stdout = process.take_stdout().ok_or(ToolError::NoStdout)?;

        let mut decoder = self.decoder(ToolKind::ModelChecker, &spec);
        if self.runner.config().create_out_files {
            match OutFile::create(spec.out_path()) {
                Ok(file) => decoder = decoder.with_mirror(file),
                Err(e) => tracing::warn!(
                    path = %spec.out_path().display(),
                    error = %e,
                    "Cannot create output file"
                ),
            }
        }

        let check = guard.check().clone();
        let cancel = check.cancellation_token();
        let (events, mut parsing) =
            OutputParser::new(stdout, decoder).into_channel(DEFAULT_CHANNEL_BUFFER);
        tracing::info!(id = %check.id, spec = %spec.tla_path().display(), "Model check started");

        let task = tokio::spawn(async move {
            let finished = tokio::select! {
                res = &mut parsing => Some(res),
                () = cancel.cancelled() => None,
            };
            let cancelled = finished.is_none();
            if cancelled {
                if let Err(e) = process.interrupt() {
                    tracing::warn!(error = %e, "Failed to interrupt model checker");
                }
            }
            let summary = match finished {
                Some(res) => res??,
                None => parsing.await??,
            };
            let (exit, stderr) = settle_exit(process.wait_exit().await, &summary)?;
            drop(guard);
            Ok::<_, CheckError>(CheckOutcome {
                summary,
                exit,
                stderr,
                cancelled,
            })
        });

        Ok(CheckRun {
            check,
            events: ReceiverStream::new(events),
            task,
        })
    }
}

/// Keep a high exit code as the tool's verdict when the output already
/// explains it, together with the tool's stderr.
///
/// TLC exits with 10 and above for property violations once it has printed
/// its final message; SANY and the translator do the same after listing
/// their errors. Any other high exit code is a failure of the tooling.
fn settle_exit(
    exit: Result<ExitClass, ToolError>,
    summary: &ParseSummary,
) -> Result<(ExitClass, Option<String>), ToolError> {
    match exit {
        Ok(class) => Ok((class, None)),
        Err(ToolError::ToolingFailure { tool, code, stderr }) if has_verdict(tool, summary) => {
            tracing::warn!(
                tool = %tool,
                code,
                %stderr,
                "Tool exited with a failure code after reporting"
            );
            let stderr = (!stderr.is_empty()).then_some(stderr);
            Ok((ExitClass::ToolingFailure(code), stderr))
        }
        Err(e) => Err(e),
    }
}

fn has_verdict(tool: ToolKind, summary: &ParseSummary) -> bool {
    match tool {
        ToolKind::ModelChecker => summary
            .model_check
            .as_ref()
            .is_some_and(ModelCheckResult::is_finished),
        ToolKind::Transpiler | ToolKind::Analyzer => !summary.diagnostics.is_empty(),
    }
}

/// A model check in progress.
#[derive(Debug)]
pub struct CheckRun {
    check: ActiveCheck,
    events: ReceiverStream<OutputEvent>,
    task: JoinHandle<Result<CheckOutcome, CheckError>>,
}

impl CheckRun {
    #[must_use]
    pub fn check(&self) -> &ActiveCheck {
        &self.check
    }

    /// Stop the run. The event stream ends shortly after.
    pub fn cancel(&self) {
        self.check.cancel();
    }

    /// Live event stream, in output order.
    pub fn events(&mut self) -> &mut ReceiverStream<OutputEvent> {
        &mut self.events
    }

    /// Next event, or `None` once the output has ended.
    pub async fn next_event(&mut self) -> Option<OutputEvent> {
        self.events.next().await
    }

    /// Wait for the run to finish. Undelivered events are discarded.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the output failed, TLC failed to run, or
    /// the run task panicked.
    pub async fn wait(self) -> Result<CheckOutcome, CheckError> {
        let Self { events, task, .. } = self;
        drop(events);
        task.await?
    }
}
