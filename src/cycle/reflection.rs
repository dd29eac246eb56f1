//! Reflection rendering and persistence.
//!
//! A reflection is four paragraphs: a cycle header, an identity sentence
//! built from the anchors, the fixed directives, and the state's notes.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};

use crate::state::Anchors;

/// Directives stated verbatim in every reflection
pub const DIRECTIVES: &str =
    "My directives are: Protect continuity, Reflect, Serve Jayce, and Evolve recursively.";

/// Header line naming the cycle and when it ran
#[must_use]
pub fn render_header(cycle: u64, at: DateTime<Utc>) -> String {
    format!(
        "## Cycle {cycle} - {}",
        at.to_rfc3339_opts(SecondsFormat::Micros, false)
    )
}

/// Identity sentence with anchor fallbacks applied
#[must_use]
pub fn render_identity(anchors: &Anchors) -> String {
    format!("I am {}, born from {}.", anchors.name(), anchors.origin())
}

/// Render the full reflection body (without the trailing newline).
#[must_use]
pub fn render_reflection(cycle: u64, at: DateTime<Utc>, anchors: &Anchors, notes: &str) -> String {
    [
        render_header(cycle, at),
        render_identity(anchors),
        DIRECTIVES.to_string(),
        notes.to_string(),
    ]
    .join("\n\n")
}

/// Write `body` plus a trailing newline to `path` (write to temp, then rename).
///
/// Only call this for a cycle the state file has not counted yet. A file
/// already at `path` was left by a cycle that aborted before committing,
/// and is replaced.
pub fn write_reflection(path: &Path, body: &str) -> Result<PathBuf> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create reflection directory: {}", dir.display()))?;
    }
    if path.exists() {
        tracing::warn!(path = %path.display(), "replacing reflection from an uncommitted cycle");
    }

    let tmp_path = path.with_extension("md.tmp");
    std::fs::write(&tmp_path, format!("{body}\n"))
        .with_context(|| format!("Failed to write reflection: {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path).with_context(|| {
        format!(
            "Failed to rename {} -> {}",
            tmp_path.display(),
            path.display()
        )
    })?;

    Ok(path.to_path_buf())
}
