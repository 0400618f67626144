//! The single in-flight model check.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::tools::SpecFiles;

use super::CheckError;

/// Handle to a running model check.
#[derive(Debug, Clone)]
pub struct ActiveCheck {
    /// Unique run identifier.
    pub id: Uuid,
    /// Files being checked.
    pub spec: SpecFiles,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Cancellation token for stopping the run.
    cancel: CancellationToken,
}

impl ActiveCheck {
    #[must_use]
    pub fn new(spec: SpecFiles) -> Self {
        Self {
            id: Uuid::new_v4(),
            spec,
            started_at: Utc::now(),
            cancel: CancellationToken::new(),
        }
    }

    /// Get a clone of the cancellation token.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel this run.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Check if this run is cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Exclusive slot for one model check at a time.
///
/// Clones share the slot. Holding a [`CheckGuard`] is what makes a run
/// active; dropping it frees the slot.
#[derive(Debug, Clone, Default)]
pub struct CheckSlot {
    active: Arc<Mutex<Option<ActiveCheck>>>,
}

impl CheckSlot {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActiveCheck>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Claim the slot for a new run on `spec`.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::AlreadyRunning` with the existing run if the
    /// slot is taken.
    pub fn try_acquire(&self, spec: SpecFiles) -> Result<CheckGuard, CheckError> {
        let mut active = self.lock();
        if let Some(existing) = active.as_ref() {
            return Err(CheckError::AlreadyRunning(Box::new(existing.clone())));
        }
        let check = ActiveCheck::new(spec);
        tracing::debug!(id = %check.id, spec = %check.spec.tla_path().display(), "Check slot acquired");
        *active = Some(check.clone());
        Ok(CheckGuard {
            slot: self.clone(),
            check,
        })
    }

    /// The run currently holding the slot.
    #[must_use]
    pub fn active(&self) -> Option<ActiveCheck> {
        self.lock().clone()
    }

    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.lock().is_some()
    }

    /// Request cancellation of the current run.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::NotRunning` if the slot is free.
    pub fn cancel_active(&self) -> Result<ActiveCheck, CheckError> {
        let active = self.lock().clone().ok_or(CheckError::NotRunning)?;
        tracing::info!(id = %active.id, "Cancelling model check");
        active.cancel();
        Ok(active)
    }
}

/// Proof of holding the [`CheckSlot`].
#[derive(Debug)]
pub struct CheckGuard {
    slot: CheckSlot,
    check: ActiveCheck,
}

impl CheckGuard {
    #[must_use]
    pub fn check(&self) -> &ActiveCheck {
        &self.check
    }
}

impl Drop for CheckGuard {
    fn drop(&mut self) {
        let mut active = self.slot.lock();
        if active.as_ref().is_some_and(|a| a.id == self.check.id) {
            *active = None;
            tracing::debug!(id = %self.check.id, "Check slot released");
        }
    }
}
