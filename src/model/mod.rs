//! Format-agnostic model of a parsed presentation.
//!
//! The deck reader converts slide XML into these structures; they are what
//! round-trip checks and the `info` command inspect.

mod document;
mod paragraph;

pub use document::*;
pub use paragraph::*;
