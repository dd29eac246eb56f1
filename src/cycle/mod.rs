//! Cycle management
//!
//! This module handles loop configuration, reflection rendering, the
//! self-update step, and the runner that sequences them.

pub mod config;
pub mod reflection;
pub mod runner;
pub mod update;
