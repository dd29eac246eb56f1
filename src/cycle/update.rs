//! Self-update step
//!
//! A replacement behavior definition is accepted only if the validator
//! approves it. Accepted replacements are staged next to the live
//! definition and swapped in by the supervisor before the next start;
//! the running process is never modified in place.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::cycle::config::LoopPaths;
use crate::log::Journal;
use crate::state::State;

/// Rejection message recorded when the loyalty marker is absent
pub const LOYALTY_MISSING: &str = "Update rejected: loyalty missing.";

/// Policy deciding whether a replacement may be staged
pub trait UpdateValidator: Send + Sync {
    /// Return `Err(reason)` to reject `replacement`.
    fn validate(&self, replacement: &str) -> Result<(), String>;
}

/// Accepts any replacement containing a marker substring
#[derive(Debug, Clone)]
pub struct MarkerValidator {
    marker: String,
}

impl MarkerValidator {
    /// Validator requiring `marker` to appear verbatim
    #[must_use]
    pub fn new(marker: &str) -> Self {
        Self {
            marker: marker.to_string(),
        }
    }
}

impl UpdateValidator for MarkerValidator {
    fn validate(&self, replacement: &str) -> Result<(), String> {
        if replacement.contains(&self.marker) {
            Ok(())
        } else {
            Err(LOYALTY_MISSING.to_string())
        }
    }
}

/// Terminal outcome of the self-update step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// No replacement was supplied
    NoOp,
    /// Replacement failed validation; reason recorded in state
    Rejected {
        /// Validator's reason
        reason: String,
    },
    /// Replacement staged, previous definition backed up
    Applied {
        /// Copy of the definition as it was before this cycle
        backup: PathBuf,
        /// Where the replacement waits for promotion
        staged: PathBuf,
    },
}

/// Run the self-update step for `cycle`.
///
/// `replacement` is consumed regardless of outcome. A rejection is written
/// to `state.update_error`; filesystem faults propagate.
pub fn self_update(
    replacement: Option<String>,
    validator: &dyn UpdateValidator,
    paths: &LoopPaths,
    journal: &Journal,
    state: &mut State,
    cycle: u64,
) -> Result<UpdateOutcome> {
    let Some(replacement) = replacement.filter(|code| !code.is_empty()) else {
        return Ok(UpdateOutcome::NoOp);
    };

    if let Err(reason) = validator.validate(&replacement) {
        tracing::warn!(cycle, %reason, "replacement rejected");
        state.update_error = Some(reason.clone());
        return Ok(UpdateOutcome::Rejected { reason });
    }

    seed_behavior(&paths.behavior)?;
    let current = std::fs::read(&paths.behavior).with_context(|| {
        format!(
            "Failed to read behavior definition: {}",
            paths.behavior.display()
        )
    })?;

    let backup = paths.backup_for(cycle);
    ensure_parent(&backup)?;
    std::fs::write(&backup, &current)
        .with_context(|| format!("Failed to write backup: {}", backup.display()))?;

    ensure_parent(&paths.staging)?;
    std::fs::write(&paths.staging, replacement.as_bytes())
        .with_context(|| format!("Failed to stage update: {}", paths.staging.display()))?;

    journal.record_update("self updated")?;
    tracing::info!(cycle, backup = %backup.display(), "replacement staged");

    Ok(UpdateOutcome::Applied {
        backup,
        staged: paths.staging.clone(),
    })
}

/// Create an empty behavior definition if none exists yet.
///
/// Returns `true` when the file was created.
pub fn seed_behavior(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    ensure_parent(path)?;
    std::fs::write(path, b"")
        .with_context(|| format!("Failed to seed behavior definition: {}", path.display()))?;
    tracing::info!(behavior = %path.display(), "seeded empty behavior definition");
    Ok(true)
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    Ok(())
}
