//! Publishing diagnostics to an external consumer (editor, terminal).

use std::collections::BTreeMap;
use std::path::PathBuf;

use super::{DiagnosticCollection, DiagnosticRecord};

/// Complete replacement set of diagnostics, keyed by file.
pub type DiagnosticBatch = BTreeMap<PathBuf, Vec<DiagnosticRecord>>;

/// Consumer of diagnostics.
///
/// Implementations receive the whole batch in one call and must replace
/// whatever they showed before.
pub trait DiagnosticSink {
    fn replace_all(&mut self, batch: DiagnosticBatch);
}

/// Apply a collection to a sink in a single step.
pub fn apply(collection: DiagnosticCollection, sink: &mut dyn DiagnosticSink) {
    let batch = collection.into_inner();
    tracing::debug!(files = batch.len(), "Applying diagnostics");
    sink.replace_all(batch);
}

/// In-memory sink that keeps the last applied batch.
#[derive(Debug, Default)]
pub struct MemoryDiagnostics {
    current: DiagnosticBatch,
    applications: usize,
}

impl MemoryDiagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Last applied batch.
    #[must_use]
    pub fn current(&self) -> &DiagnosticBatch {
        &self.current
    }

    /// How many times a batch was applied.
    #[must_use]
    pub fn applications(&self) -> usize {
        self.applications
    }
}

impl DiagnosticSink for MemoryDiagnostics {
    fn replace_all(&mut self, batch: DiagnosticBatch) {
        self.current = batch;
        self.applications += 1;
    }
}
