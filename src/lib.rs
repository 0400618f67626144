//! TLA+ Runner - run the TLA+ tools and decode their output.

pub mod check;
pub mod config;
pub mod diagnostic;
pub mod display;
pub mod output;
pub mod process;
pub mod tools;
