//! Building tool command lines from configuration and launching them.

use std::path::{Path, PathBuf};

use crate::config::ToolsConfig;
use crate::tools::{build_tool_args, java_command_line, split_arguments, SpecFiles, ToolKind};

use super::{JavaLocator, ToolError, ToolProcess};

/// Launches the tools through Java according to a [`ToolsConfig`].
#[derive(Debug)]
pub struct ToolRunner {
    config: ToolsConfig,
    java: JavaLocator,
}

impl ToolRunner {
    #[must_use]
    pub fn new(config: ToolsConfig) -> Self {
        Self {
            config,
            java: JavaLocator::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &ToolsConfig {
        &self.config
    }

    /// Options configured for `kind`, tokenized.
    #[must_use]
    pub fn configured_options(&self, kind: ToolKind) -> Vec<String> {
        match kind {
            ToolKind::Transpiler => split_arguments(&self.config.pluscal_options),
            ToolKind::Analyzer => Vec::new(),
            ToolKind::ModelChecker => split_arguments(&self.config.tlc_options),
        }
    }

    /// Resolve Java and build the full command line for one tool run.
    ///
    /// # Errors
    ///
    /// Returns an error if no suitable Java runtime is available or the
    /// archive path cannot be made absolute.
    pub async fn command_line(
        &self,
        kind: ToolKind,
        spec: &SpecFiles,
        user_args: &[String],
    ) -> Result<(PathBuf, Vec<String>), ToolError> {
        let runtime = self.java.resolve(self.config.java_home.as_deref()).await?;
        let jar = absolute(&self.config.tools_jar_path())?;
        let java_opts = split_arguments(&self.config.java_options);
        let tool_args = build_tool_args(kind, spec.tla_path(), spec.cfg_path(), user_args);
        let args = java_command_line(&java_opts, &jar, kind, &tool_args);
        Ok((runtime.executable, args))
    }

    /// Start `kind` on `spec` inside the spec's directory.
    ///
    /// # Errors
    ///
    /// Returns an error if Java cannot be resolved or the process fails to
    /// spawn.
    pub async fn run(
        &self,
        kind: ToolKind,
        spec: &SpecFiles,
        user_args: &[String],
    ) -> Result<ToolProcess, ToolError> {
        let (java, args) = self.command_line(kind, spec, user_args).await?;
        tracing::debug!(
            tool = %kind,
            command = %shell_line(&java, &args),
            cwd = %spec.spec_dir().display(),
            "Launching tool"
        );
        ToolProcess::spawn(kind, &java, &args, Some(spec.spec_dir()))
    }
}

fn absolute(path: &Path) -> Result<PathBuf, ToolError> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn shell_line(program: &Path, args: &[String]) -> String {
    std::iter::once(program.to_string_lossy())
        .chain(args.iter().map(|a| std::borrow::Cow::Borrowed(a.as_str())))
        .map(shell_escape::escape)
        .collect::<Vec<_>>()
        .join(" ")
}
