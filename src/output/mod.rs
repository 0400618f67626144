//! Decoding of tool standard output into typed events.
//!
//! TLC interleaves free text with blocks delimited by sentinel lines
//! (`@!@!@STARTMSG 2185:0 @!@!@` ... `@!@!@ENDMSG 2185 @!@!@`). PlusCal and
//! SANY print plain text only. [`OutputDecoder`] is the line-level state
//! machine; [`OutputParser`] drives it from an async reader.

mod decoder;
mod events;
mod model;
mod pluscal;
mod protocol;
mod sany;
mod sink;
mod stream;
mod tlc;

pub use decoder::*;
pub use events::*;
pub use model::*;
pub use protocol::*;
pub use sink::*;
pub use stream::*;
pub use tlc::codes;
