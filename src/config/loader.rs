//! Layered loading of [`ToolsConfig`] from TOML files.
//!
//! The user-wide file is read first and the project file in the current
//! directory is laid over it, key by key, so a project only has to name the
//! settings it changes.

use std::path::{Path, PathBuf};

use toml::Table;

use super::ToolsConfig;

/// Project file looked up in the current directory.
pub const LOCAL_CONFIG_FILE: &str = ".tlaplus-runner.toml";

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file {0} does not exist")]
    NotFound(PathBuf),

    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Where a layer comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Layer {
    /// Skipped when absent.
    Optional(PathBuf),
    /// Named explicitly; must exist.
    Required(PathBuf),
}

impl Layer {
    fn path(&self) -> &Path {
        match self {
            Self::Optional(p) | Self::Required(p) => p,
        }
    }
}

/// Loads configuration from an ordered list of files.
#[derive(Debug)]
pub struct ConfigLoader {
    layers: Vec<Layer>,
}

impl ConfigLoader {
    /// User config (`<config dir>/tlaplus-runner/config.toml`) overridden by
    /// [`LOCAL_CONFIG_FILE`].
    #[must_use]
    pub fn new() -> Self {
        let mut layers = Vec::new();
        if let Some(config_dir) = dirs::config_dir() {
            layers.push(Layer::Optional(
                config_dir.join("tlaplus-runner").join("config.toml"),
            ));
        }
        layers.push(Layer::Optional(PathBuf::from(LOCAL_CONFIG_FILE)));
        Self { layers }
    }

    /// Load only `path`, which must exist.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            layers: vec![Layer::Required(path)],
        }
    }

    /// Files consulted, lowest priority first.
    #[must_use]
    pub fn search_paths(&self) -> Vec<&Path> {
        self.layers.iter().map(Layer::path).collect()
    }

    /// Merge every existing layer over the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a required file is missing, or an existing file
    /// cannot be read or is not a valid configuration.
    pub fn load(&self) -> Result<ToolsConfig, ConfigError> {
        let mut merged = Table::new();
        let mut last = None;
        for layer in &self.layers {
            let path = layer.path();
            if !path.exists() {
                if let Layer::Required(p) = layer {
                    return Err(ConfigError::NotFound(p.clone()));
                }
                continue;
            }
            tracing::debug!(path = %path.display(), "Loading config file");
            merge_tables(&mut merged, read_table(path)?);
            last = Some(path);
        }

        let Some(path) = last else {
            tracing::debug!("No config file found, using defaults");
            return Ok(ToolsConfig::default());
        };
        // Type errors only surface once the layers are combined; blame the
        // most specific file.
        toml::Value::Table(merged)
            .try_into::<ToolsConfig>()
            .map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                source: e,
            })
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn read_table(path: &Path) -> Result<Table, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    content.parse::<Table>().map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Lay `over` onto `base`. Nested tables merge, everything else replaces.
fn merge_tables(base: &mut Table, over: Table) {
    for (key, value) in over {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
