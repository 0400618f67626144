//! Model checking with the TLC debugger enabled.

use std::net::{Ipv4Addr, TcpListener};
use std::time::Duration;

use async_trait::async_trait;

use crate::tools::SpecFiles;

use super::{CheckError, CheckRun, Workflow};

/// Time between launching TLC and asking the front end to attach.
///
/// TLC offers no readiness signal, so this is a guess: a slow JVM start can
/// still lose the race.
pub const DEFAULT_ATTACH_DELAY: Duration = Duration::from_secs(2);

/// Debug adapter client that connects to TLC's debugger port.
#[async_trait]
pub trait DebugFrontend: Send + Sync {
    async fn attach(&self, port: u16) -> std::io::Result<()>;
}

/// Find a free local TCP port.
///
/// The port is released before returning, so another process may grab it
/// first.
///
/// # Errors
///
/// Returns an error if no local port can be bound.
pub fn pick_free_port() -> std::io::Result<u16> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))?;
    Ok(listener.local_addr()?.port())
}

/// Arguments that make TLC listen for a debugger on `port`.
#[must_use]
pub fn debugger_args(port: u16) -> Vec<String> {
    vec!["-debugger".to_string(), format!("port={port}")]
}

impl Workflow {
    /// Start a model check with the debugger enabled and attach `frontend`
    /// after `delay`.
    ///
    /// # Errors
    ///
    /// Returns an error if no port is available, the check cannot start, or
    /// the front end fails to attach. A started check is cancelled when
    /// attaching fails.
    pub async fn check_and_debug(
        &self,
        spec: SpecFiles,
        user_args: &[String],
        frontend: &dyn DebugFrontend,
        delay: Duration,
    ) -> Result<CheckRun, CheckError> {
        let port = pick_free_port()?;
        let mut args = user_args.to_vec();
        args.extend(debugger_args(port));

        let run = self.check_model(spec, &args).await?;
        tracing::debug!(port, delay_ms = delay.as_millis(), "Waiting before debugger attach");
        tokio::time::sleep(delay).await;

        if let Err(e) = frontend.attach(port).await {
            tracing::warn!(port, error = %e, "Debugger attach failed, stopping check");
            run.cancel();
            return Err(CheckError::Attach(e));
        }
        tracing::info!(port, "Debugger attached");
        Ok(run)
    }
}
