//! Locating the Java runtime that hosts the tools.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::OnceLock;

use regex::Regex;
use tokio::process::Command;
use tokio::sync::Mutex;

use super::ToolError;

/// Oldest Java major version the tools run on.
pub const MIN_JAVA_MAJOR: u32 = 8;

#[cfg(windows)]
const JAVA_EXECUTABLE: &str = "java.exe";
#[cfg(not(windows))]
const JAVA_EXECUTABLE: &str = "java";

fn version_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"version "([^"]+)""#).expect("valid java version regex"))
}

/// Version reported by `java -version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaVersion {
    /// The quoted version string, e.g. `1.8.0_202` or `17.0.2`.
    pub full: String,
    /// Major version with the legacy `1.` prefix removed.
    pub major: u32,
}

/// Extract the version from `java -version` output.
#[must_use]
pub fn parse_java_version(output: &str) -> Option<JavaVersion> {
    let full = version_re().captures(output)?.get(1)?.as_str().to_string();
    let mut parts = full.split(|c: char| c == '.' || c == '_' || c == '-' || c == '+');
    let first = leading_number(parts.next()?)?;
    let major = if first == 1 {
        leading_number(parts.next()?)?
    } else {
        first
    };
    Some(JavaVersion { full, major })
}

fn leading_number(part: &str) -> Option<u32> {
    let end = part
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(part.len());
    part[..end].parse().ok()
}

/// A resolved and version-checked Java executable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaRuntime {
    pub executable: PathBuf,
    pub version: JavaVersion,
}

/// Resolves the `java` executable once per configured `java_home`.
///
/// The cache is keyed by the `java_home` value it was resolved for; asking
/// with a different value resolves and probes again.
#[derive(Debug, Default)]
pub struct JavaLocator {
    cached: Mutex<Option<(Option<PathBuf>, JavaRuntime)>>,
}

impl JavaLocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the runtime for `java_home`, or `java` on `PATH` when `None`.
    ///
    /// # Errors
    ///
    /// Returns `ToolError::ToolingUnavailable` if the executable is missing,
    /// cannot be started, or reports a version older than
    /// [`MIN_JAVA_MAJOR`].
    pub async fn resolve(&self, java_home: Option<&Path>) -> Result<JavaRuntime, ToolError> {
        let mut cached = self.cached.lock().await;
        if let Some((key, runtime)) = cached.as_ref() {
            if key.as_deref() == java_home {
                tracing::trace!(java = %runtime.executable.display(), "Java runtime cache hit");
                return Ok(runtime.clone());
            }
        }

        let executable = java_executable(java_home)?;
        let version = probe_version(&executable).await?;
        tracing::debug!(
            java = %executable.display(),
            version = %version.full,
            "Resolved Java runtime"
        );
        let runtime = JavaRuntime {
            executable,
            version,
        };
        *cached = Some((java_home.map(Path::to_path_buf), runtime.clone()));
        Ok(runtime)
    }
}

fn java_executable(java_home: Option<&Path>) -> Result<PathBuf, ToolError> {
    let Some(home) = java_home else {
        return Ok(PathBuf::from(JAVA_EXECUTABLE));
    };
    let path = home.join("bin").join(JAVA_EXECUTABLE);
    if path.is_file() {
        Ok(path)
    } else {
        Err(ToolError::ToolingUnavailable(format!(
            "Java executable {} not found",
            path.display()
        )))
    }
}

async fn probe_version(executable: &Path) -> Result<JavaVersion, ToolError> {
    let output = Command::new(executable)
        .arg("-version")
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| {
            ToolError::ToolingUnavailable(format!(
                "Cannot run {}: {e}",
                executable.display()
            ))
        })?;

    // The version banner goes to stderr.
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let version = parse_java_version(&stderr)
        .or_else(|| parse_java_version(&stdout))
        .ok_or_else(|| {
            ToolError::ToolingUnavailable(format!(
                "Cannot determine the version of {}",
                executable.display()
            ))
        })?;

    if version.major < MIN_JAVA_MAJOR {
        return Err(ToolError::ToolingUnavailable(format!(
            "Java {} is too old, {MIN_JAVA_MAJOR} or newer is required",
            version.full
        )));
    }
    Ok(version)
}
