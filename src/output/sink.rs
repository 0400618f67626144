//! Destinations for raw output lines.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Receives output lines one at a time.
pub trait LineSink: Send {
    fn line(&mut self, line: &str);

    /// Called once when the stream has ended.
    fn close(&mut self) {}
}

impl<S: LineSink + ?Sized> LineSink for Box<S> {
    fn line(&mut self, line: &str) {
        (**self).line(line);
    }

    fn close(&mut self) {
        (**self).close();
    }
}

impl LineSink for Vec<String> {
    fn line(&mut self, line: &str) {
        self.push(line.to_string());
    }
}

/// Line collector that can be inspected while a parser owns a clone.
#[derive(Debug, Clone, Default)]
pub struct SharedLines(Arc<Mutex<Vec<String>>>);

impl SharedLines {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the lines received so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.0.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

impl LineSink for SharedLines {
    fn line(&mut self, line: &str) {
        if let Ok(mut lines) = self.0.lock() {
            lines.push(line.to_string());
        }
    }
}

/// Mirrors raw tool output into a side file such as `Spec.out`.
///
/// Write failures are logged once and further lines are dropped; the run
/// itself is not affected.
#[derive(Debug)]
pub struct OutFile {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
}

impl OutFile {
    /// Create (or truncate) the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path)?;
        tracing::debug!(path = %path.display(), "Saving tool output");
        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn fail(&mut self, err: &std::io::Error) {
        tracing::warn!(path = %self.path.display(), error = %err, "Cannot write output file");
        self.writer = None;
    }
}

impl LineSink for OutFile {
    fn line(&mut self, line: &str) {
        if let Some(writer) = self.writer.as_mut() {
            if let Err(e) = writeln!(writer, "{line}") {
                self.fail(&e);
            }
        }
    }

    fn close(&mut self) {
        if let Some(writer) = self.writer.as_mut() {
            if let Err(e) = writer.flush() {
                self.fail(&e);
            }
        }
    }
}

impl Drop for OutFile {
    fn drop(&mut self) {
        self.close();
    }
}
