//! The three TLA+ tools bundled in `tla2tools.jar`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Which external tool is being invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// PlusCal to TLA+ translator.
    Transpiler,
    /// SANY syntactic and semantic analyzer.
    Analyzer,
    /// TLC model checker.
    ModelChecker,
}

impl ToolKind {
    /// Java main class that runs this tool.
    #[must_use]
    pub fn main_class(self) -> &'static str {
        match self {
            Self::Transpiler => "pcal.trans",
            Self::Analyzer => "tla2sany.SANY",
            Self::ModelChecker => "tlc2.TLC",
        }
    }

    /// Short human-readable name.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Transpiler => "PlusCal",
            Self::Analyzer => "SANY",
            Self::ModelChecker => "TLC",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
