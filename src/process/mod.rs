//! Spawning and supervising the Java-hosted tools.

mod error;
mod exit;
mod java;
mod runner;
mod tool;

pub use error::*;
pub use exit::*;
pub use java::*;
pub use runner::*;
pub use tool::*;
