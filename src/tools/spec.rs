//! Module/model file pairs that a check request operates on.

use std::path::{Path, PathBuf};

/// Errors raised while locating the files of a specification.
#[derive(thiserror::Error, Debug)]
pub enum SpecError {
    /// The file is neither a `.tla` module nor a `.cfg` model.
    #[error("Not a .tla or .cfg file: {0}")]
    NotASpec(PathBuf),
    /// The `.tla` module next to the given `.cfg` does not exist.
    #[error("Corresponding TLA+ module file {0} doesn't exist")]
    MissingModule(PathBuf),
    /// The `.cfg` model next to the given `.tla` does not exist.
    #[error("Model file {0} doesn't exist")]
    MissingModel(PathBuf),
    /// The current directory could not be determined.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Immutable pair of the primary module and its model configuration.
///
/// Both paths are absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecFiles {
    tla_path: PathBuf,
    cfg_path: PathBuf,
}

impl SpecFiles {
    /// Create a pair from explicit paths, resolving relative ones against
    /// the current directory.
    ///
    /// # Errors
    ///
    /// Returns `SpecError::Io` if the current directory is unavailable.
    pub fn new(tla_path: impl AsRef<Path>, cfg_path: impl AsRef<Path>) -> Result<Self, SpecError> {
        Ok(Self {
            tla_path: absolute(tla_path.as_ref())?,
            cfg_path: absolute(cfg_path.as_ref())?,
        })
    }

    /// Derive the pair from either of its members.
    ///
    /// A `.tla` file is paired with the sibling `.cfg` of the same name and
    /// vice versa. The counterpart must exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the extension is unknown or the counterpart is
    /// missing.
    pub fn discover(path: impl AsRef<Path>) -> Result<Self, SpecError> {
        let path = absolute(path.as_ref())?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("tla") => {
                let cfg = path.with_extension("cfg");
                if !cfg.exists() {
                    return Err(SpecError::MissingModel(cfg));
                }
                Ok(Self {
                    tla_path: path,
                    cfg_path: cfg,
                })
            }
            Some("cfg") => {
                let tla = path.with_extension("tla");
                if !tla.exists() {
                    return Err(SpecError::MissingModule(tla));
                }
                Ok(Self {
                    tla_path: tla,
                    cfg_path: path,
                })
            }
            _ => Err(SpecError::NotASpec(path)),
        }
    }

    /// Path of the `.tla` module.
    #[must_use]
    pub fn tla_path(&self) -> &Path {
        &self.tla_path
    }

    /// Path of the `.cfg` model.
    #[must_use]
    pub fn cfg_path(&self) -> &Path {
        &self.cfg_path
    }

    /// Directory containing the module; tools run from here.
    #[must_use]
    pub fn spec_dir(&self) -> &Path {
        self.tla_path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Path of the raw output side file (`<module>.out`).
    #[must_use]
    pub fn out_path(&self) -> PathBuf {
        self.tla_path.with_extension("out")
    }
}

fn absolute(path: &Path) -> Result<PathBuf, std::io::Error> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
