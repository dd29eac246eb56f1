//! Append-only text journals
//!
//! Three logs live side by side in the log directory:
//! - `cycle.log`: one `Cycle {n}: {intel}` line per completed cycle
//! - `updates.log`: one timestamped line per staged or promoted update
//! - `chat.log`: one timestamped line per operator message

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::fs::{self, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

/// Format a timestamp the way every journal line starts: `{iso} UTC`
#[must_use]
pub fn stamp(at: DateTime<Utc>) -> String {
    format!("{} UTC", at.format("%Y-%m-%dT%H:%M:%S%.6f"))
}

/// Writer for the cycle, update and chat logs
#[derive(Debug, Clone)]
pub struct Journal {
    cycle_path: PathBuf,
    updates_path: PathBuf,
    chat_path: PathBuf,
}

impl Journal {
    /// Create a journal rooted at `log_dir`
    ///
    /// # Errors
    /// Returns an error if the log directory cannot be created
    pub fn new<P: AsRef<Path>>(log_dir: P) -> Result<Self> {
        let log_dir = log_dir.as_ref();

        fs::create_dir_all(log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

        Ok(Self {
            cycle_path: log_dir.join("cycle.log"),
            updates_path: log_dir.join("updates.log"),
            chat_path: log_dir.join("chat.log"),
        })
    }

    /// Record the outcome line for a finished cycle
    pub fn record_cycle(&self, cycle: u64, intel_summary: &str) -> Result<()> {
        append_line(&self.cycle_path, &format!("Cycle {cycle}: {intel_summary}"))
    }

    /// Record a self-update event, stamped with the current time
    pub fn record_update(&self, event: &str) -> Result<()> {
        append_line(
            &self.updates_path,
            &format!("{}: {event}", stamp(Utc::now())),
        )
    }

    /// Record an operator message, stamped with the current time
    pub fn record_chat(&self, message: &str) -> Result<()> {
        append_line(
            &self.chat_path,
            &format!("{}: {message}", stamp(Utc::now())),
        )
    }

    /// Path of `cycle.log`
    #[must_use]
    pub fn cycle_path(&self) -> &Path {
        &self.cycle_path
    }

    /// Path of `updates.log`
    #[must_use]
    pub fn updates_path(&self) -> &Path {
        &self.updates_path
    }

    /// Path of `chat.log`
    #[must_use]
    pub fn chat_path(&self) -> &Path {
        &self.chat_path
    }
}

/// Read every non-empty line of a journal; a missing file reads as empty.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read log file: {}", path.display()))?;

    Ok(content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect())
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file: {}", path.display()))?;

    writeln!(file, "{line}")
        .with_context(|| format!("Failed to write to log file: {}", path.display()))?;

    Ok(())
}
