//! Per-file diagnostic collections.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Diagnostic severity as understood by editors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Information,
    Hint,
}

/// Zero-based line/column position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    #[must_use]
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Convert the 1-based coordinates the tools print.
    #[must_use]
    pub fn from_one_based(line: u32, column: u32) -> Self {
        Self {
            line: line.saturating_sub(1),
            column: column.saturating_sub(1),
        }
    }
}

/// Half-open text range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Range {
    pub start: Position,
    pub end: Position,
}

impl Range {
    #[must_use]
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }

    /// Range covering a single point.
    #[must_use]
    pub fn point(at: Position) -> Self {
        Self { start: at, end: at }
    }
}

/// A single finding reported by a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticRecord {
    pub file: PathBuf,
    pub range: Range,
    pub severity: Severity,
    pub text: String,
}

impl DiagnosticRecord {
    #[must_use]
    pub fn new(file: impl Into<PathBuf>, range: Range, severity: Severity, text: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            range,
            severity,
            text: text.into(),
        }
    }

    /// Records with the same file, range and text describe the same finding.
    #[must_use]
    pub fn same_finding(&self, other: &Self) -> bool {
        self.file == other.file && self.range == other.range && self.text == other.text
    }
}

/// Diagnostics grouped by file, each group in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosticCollection {
    files: BTreeMap<PathBuf, Vec<DiagnosticRecord>>,
}

impl DiagnosticCollection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record. Returns `false` if an identical finding is already
    /// present for that file.
    pub fn add(&mut self, record: DiagnosticRecord) -> bool {
        let records = self.files.entry(record.file.clone()).or_default();
        if records.iter().any(|r| r.same_finding(&record)) {
            return false;
        }
        records.push(record);
        true
    }

    /// Append every record of `other` after the existing ones, keeping
    /// duplicates.
    pub fn extend(&mut self, other: DiagnosticCollection) {
        for (file, records) in other.files {
            self.files.entry(file).or_default().extend(records);
        }
    }

    /// Records for one file.
    #[must_use]
    pub fn get(&self, file: &Path) -> &[DiagnosticRecord] {
        self.files.get(file).map_or(&[], Vec::as_slice)
    }

    /// Files that have at least one record, in sorted order.
    pub fn files(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }

    /// Iterate `(file, records)` groups.
    pub fn iter(&self) -> impl Iterator<Item = (&Path, &[DiagnosticRecord])> {
        self.files.iter().map(|(f, r)| (f.as_path(), r.as_slice()))
    }

    /// Total number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.values().all(Vec::is_empty)
    }

    /// Number of records with the given severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.files
            .values()
            .flatten()
            .filter(|r| r.severity == severity)
            .count()
    }

    pub(crate) fn into_inner(self) -> BTreeMap<PathBuf, Vec<DiagnosticRecord>> {
        self.files
    }
}

/// Merge collections in call order.
///
/// Records from different collections are never deduplicated: two runs
/// reporting the same finding are independent results.
#[must_use]
pub fn merge(collections: impl IntoIterator<Item = DiagnosticCollection>) -> DiagnosticCollection {
    let mut merged = DiagnosticCollection::new();
    for collection in collections {
        merged.extend(collection);
    }
    merged
}
