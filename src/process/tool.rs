//! A running tool process.

use std::path::Path;
use std::process::Stdio;

use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::task::JoinHandle;

use crate::tools::ToolKind;

use super::{ExitClass, SpawnError, ToolError};

/// A spawned tool with piped output.
///
/// stderr is drained by a background task from the moment of spawning so a
/// chatty JVM can never block on a full pipe.
#[derive(Debug)]
pub struct ToolProcess {
    kind: ToolKind,
    child: Child,
    stderr: Option<JoinHandle<String>>,
    interrupted: bool,
}

impl ToolProcess {
    /// Spawn `program` with `args`, optionally inside `working_dir`.
    ///
    /// # Errors
    ///
    /// Returns `ToolError::Spawn` if the process fails to spawn.
    pub fn spawn(
        kind: ToolKind,
        program: &Path,
        args: &[String],
        working_dir: Option<&Path>,
    ) -> Result<Self, ToolError> {
        let mut cmd = Command::new(program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = working_dir {
            cmd.current_dir(dir);
        }

        let mut child = cmd.spawn().map_err(|e| SpawnError::from_io(program, e))?;
        tracing::debug!(tool = %kind, pid = ?child.id(), "Spawned tool process");

        let stderr = child.stderr.take().map(collect_stderr);
        Ok(Self {
            kind,
            child,
            stderr,
            interrupted: false,
        })
    }

    #[must_use]
    pub fn kind(&self) -> ToolKind {
        self.kind
    }

    /// Take ownership of the stdout handle.
    ///
    /// This can only be called once; subsequent calls return `None`.
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.child.stdout.take()
    }

    /// Get the process ID, if still running.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Whether [`ToolProcess::interrupt`] has delivered a signal.
    #[must_use]
    pub fn was_interrupted(&self) -> bool {
        self.interrupted
    }

    /// Ask the tool to stop.
    ///
    /// On Unix this sends SIGINT so the JVM runs its shutdown hooks; other
    /// platforms kill the process. Interrupting a process that has already
    /// exited or was already interrupted does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the process state cannot be queried or the
    /// signal cannot be delivered.
    pub fn interrupt(&mut self) -> Result<(), ToolError> {
        if self.interrupted || self.child.try_wait()?.is_some() {
            return Ok(());
        }
        self.send_interrupt()?;
        self.interrupted = true;
        tracing::info!(tool = %self.kind, pid = ?self.child.id(), "Interrupted tool process");
        Ok(())
    }

    #[cfg(unix)]
    fn send_interrupt(&mut self) -> Result<(), ToolError> {
        use nix::errno::Errno;
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        let Some(pid) = self.child.id() else {
            return Ok(());
        };
        let nix_pid = Pid::from_raw(i32::try_from(pid).unwrap_or(i32::MAX));
        match kill(nix_pid, Signal::SIGINT) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(e) => Err(ToolError::Io(e.into())),
        }
    }

    #[cfg(not(unix))]
    fn send_interrupt(&mut self) -> Result<(), ToolError> {
        self.child.start_kill()?;
        Ok(())
    }

    /// Wait for the process to exit and classify how it ended.
    ///
    /// A process that was interrupted is reported as `Terminated` whatever
    /// its exit code.
    ///
    /// # Errors
    ///
    /// Returns `ToolError::ToolingFailure` with the collected stderr when the
    /// exit code is 10 or above.
    pub async fn wait_exit(&mut self) -> Result<ExitClass, ToolError> {
        let status = self.child.wait().await?;
        let stderr = match self.stderr.take() {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };

        let class = if self.interrupted && !status.success() {
            ExitClass::Terminated
        } else {
            ExitClass::classify(status)
        };
        tracing::debug!(tool = %self.kind, ?status, ?class, "Tool process exited");

        match class {
            ExitClass::ToolingFailure(code) => Err(ToolError::ToolingFailure {
                tool: self.kind,
                code,
                stderr: stderr.trim_end().to_string(),
            }),
            ExitClass::Terminated if !self.interrupted => {
                tracing::warn!(tool = %self.kind, "Tool process was terminated by a signal");
                Ok(class)
            }
            _ => Ok(class),
        }
    }
}

fn collect_stderr(mut stderr: ChildStderr) -> JoinHandle<String> {
    tokio::spawn(async move {
        let mut buf = Vec::new();
        if let Err(e) = stderr.read_to_end(&mut buf).await {
            tracing::debug!(error = %e, "Failed to read tool stderr");
        }
        String::from_utf8_lossy(&buf).into_owned()
    })
}
