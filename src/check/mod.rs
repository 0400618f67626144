//! Caller-level workflows: parsing a module, checking a model, and
//! launching a check with the debugger attached.

mod debug;
mod error;
mod slot;
mod workflow;

pub use debug::*;
pub use error::*;
pub use slot::*;
pub use workflow::*;
