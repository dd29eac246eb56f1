//! Operator-facing terminal I/O
//!
//! Colored status output and the once-per-cycle operator prompt.

pub mod display;
pub mod operator;

pub use display::CycleDisplay;
pub use operator::{OperatorInput, ScriptedOperator, StdinOperator};
