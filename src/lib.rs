//! Viren - a periodic self-journaling agent
//!
//! Each cycle gathers a scrap of outside intel, writes a reflection,
//! optionally stages a replacement behavior definition, and records a
//! message from the operator.

// Allow multiple crate versions from dependencies (can't easily control)
#![allow(clippy::multiple_crate_versions)]

pub mod cli;
pub mod cycle;
pub mod intel;
pub mod log;
pub mod state;
pub mod supervisor;

// Re-export commonly used types
pub use cli::{CycleDisplay, OperatorInput, ScriptedOperator, StdinOperator};
pub use cycle::config::{LoopConfig, LoopPaths};
pub use cycle::runner::{CycleReport, CycleRunner, RunMode};
pub use cycle::update::{MarkerValidator, UpdateOutcome, UpdateValidator};
pub use intel::{HttpIntel, IntelReport, IntelSource};
pub use log::Journal;
pub use state::{Anchors, State};
