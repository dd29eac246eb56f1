//! Cycle runner
//!
//! Executes one reflection cycle in a fixed order:
//! load, increment, fetch, reflect, self-update, persist, log, print, prompt.
//! Intel and validation faults are recorded as data; filesystem faults abort
//! the cycle.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;

use crate::cli::display::CycleDisplay;
use crate::cli::operator::{normalize_message, OperatorInput, PROMPT};
use crate::cycle::config::LoopPaths;
use crate::cycle::reflection::{render_reflection, write_reflection};
use crate::cycle::update::{self_update, UpdateOutcome, UpdateValidator};
use crate::intel::{gather_intel, IntelReport, IntelSource};
use crate::log::Journal;
use crate::state::{Anchors, State};

/// What one completed cycle produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleReport {
    /// The cycle number just completed
    pub cycle: u64,
    /// Reflection written by this cycle
    pub reflection: PathBuf,
    /// Rendered reflection body, as printed
    pub body: String,
    /// Outcome of the intel fetch
    pub intel: IntelReport,
    /// Outcome of the self-update step
    pub update: UpdateOutcome,
    /// Operator message, if one was left
    pub message: Option<String>,
}

/// How many cycles to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Run a single cycle and return
    Once,
    /// Run until interrupted, sleeping `pause` between cycles
    Forever {
        /// Pause between cycles
        pause: Duration,
    },
}

/// Runs reflection cycles against a fixed set of paths and collaborators
pub struct CycleRunner {
    paths: LoopPaths,
    intel: Box<dyn IntelSource>,
    validator: Box<dyn UpdateValidator>,
    operator: Box<dyn OperatorInput>,
}

impl CycleRunner {
    /// Create a runner with the given collaborators
    #[must_use]
    pub fn new(
        paths: LoopPaths,
        intel: Box<dyn IntelSource>,
        validator: Box<dyn UpdateValidator>,
        operator: Box<dyn OperatorInput>,
    ) -> Self {
        Self {
            paths,
            intel,
            validator,
            operator,
        }
    }

    /// Paths this runner reads and writes
    #[must_use]
    pub const fn paths(&self) -> &LoopPaths {
        &self.paths
    }

    /// Run one cycle end-to-end.
    ///
    /// `replacement` is a one-shot behavior definition for the self-update
    /// step; it is consumed whether or not it is accepted.
    pub async fn run_cycle(&self, replacement: Option<String>) -> Result<CycleReport> {
        let anchors = Anchors::load(&self.paths.anchors)?;
        let mut state = State::load(&self.paths.state)?;
        let legacy_replacement = state.take_pending_update();

        let cycle = state.advance();
        let display = CycleDisplay::new(cycle);
        display.print_header();
        tracing::debug!(cycle, "cycle started");

        std::fs::create_dir_all(&self.paths.intel).with_context(|| {
            format!(
                "Failed to create intel directory: {}",
                self.paths.intel.display()
            )
        })?;
        let journal = Journal::new(&self.paths.logs)?;

        let intel = gather_intel(self.intel.as_ref(), &self.paths.intel_for(cycle)).await;
        let intel_summary = intel.summary();
        state.last_intel = Some(intel_summary.clone());
        display.print_intel(&intel);

        let body = render_reflection(cycle, Utc::now(), &anchors, state.notes());
        let reflection = write_reflection(&self.paths.reflection_for(cycle), &body)?;

        let update = self_update(
            replacement.or(legacy_replacement),
            self.validator.as_ref(),
            &self.paths,
            &journal,
            &mut state,
            cycle,
        )?;
        display.print_update(&update);

        state.last_reflection = Some(self.paths.relative(&reflection).display().to_string());
        state.save(&self.paths.state)?;

        journal.record_cycle(cycle, &intel_summary)?;

        display.print_reflection(&body);

        let message = normalize_message(self.operator.read_line(PROMPT).await?);
        if let Some(message) = &message {
            journal.record_chat(message)?;
        }

        tracing::info!(cycle, reflection = %reflection.display(), "cycle complete");

        Ok(CycleReport {
            cycle,
            reflection,
            body,
            intel,
            update,
            message,
        })
    }

    /// Run cycles according to `mode`.
    ///
    /// `replacement` applies to the first cycle only. In forever mode this
    /// returns only on error.
    pub async fn run(&self, replacement: Option<String>, mode: RunMode) -> Result<()> {
        let mut replacement = replacement;
        loop {
            self.run_cycle(replacement.take()).await?;
            match mode {
                RunMode::Once => return Ok(()),
                RunMode::Forever { pause } => tokio::time::sleep(pause).await,
            }
        }
    }
}
