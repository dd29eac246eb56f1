//! Logging and observability
//!
//! Append-only journals for cycle, update and chat history, plus
//! developer tracing on stderr.

pub mod diagnostics;
pub mod journal;

pub use journal::{read_lines, Journal};
