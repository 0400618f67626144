//! Tool kinds, spec file pairs, and argument construction.

mod args;
mod kind;
mod spec;
mod split;

pub use args::*;
pub use kind::*;
pub use spec::*;
pub use split::*;
