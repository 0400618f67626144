//! Configuration types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Archive name looked up in the current directory when `tools_jar` is unset.
pub const DEFAULT_TOOLS_JAR: &str = "tla2tools.jar";

/// Settings for locating Java and invoking the TLA+ tools.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    /// Java installation to use instead of `java` on `PATH`.
    pub java_home: Option<PathBuf>,
    /// Extra JVM options, tokenized like a shell command line.
    pub java_options: String,
    /// Mirror raw model checker output into `<spec>.out`.
    pub create_out_files: bool,
    /// Path to `tla2tools.jar`.
    pub tools_jar: Option<PathBuf>,
    /// Extra options for the PlusCal translator.
    pub pluscal_options: String,
    /// Extra options for TLC.
    pub tlc_options: String,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            java_home: None,
            java_options: String::new(),
            create_out_files: true,
            tools_jar: None,
            pluscal_options: String::new(),
            tlc_options: String::new(),
        }
    }
}

impl ToolsConfig {
    /// The configured archive, or [`DEFAULT_TOOLS_JAR`].
    #[must_use]
    pub fn tools_jar_path(&self) -> PathBuf {
        self.tools_jar
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TOOLS_JAR))
    }
}
