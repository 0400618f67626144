//! Diagnostic records and their aggregation across tool runs.

mod collection;
mod sink;

pub use collection::*;
pub use sink::*;
