//! Terminal display for cycle execution
//!
//! Status lines go to stderr; the reflection body goes to stdout so it
//! can be piped.

use colored::Colorize;

use crate::cycle::update::UpdateOutcome;
use crate::intel::IntelReport;

/// Display handler for one cycle
pub struct CycleDisplay {
    cycle: u64,
}

impl CycleDisplay {
    /// Create a display handler for `cycle`
    #[must_use]
    pub const fn new(cycle: u64) -> Self {
        Self { cycle }
    }

    /// Print the cycle banner
    pub fn print_header(&self) {
        eprintln!(
            "\n{} {}",
            "===".bold().cyan(),
            format!("Cycle {}", self.cycle).bold().cyan()
        );
        eprintln!("{}", "─".repeat(50).dimmed());
    }

    /// Print how the intel fetch went
    pub fn print_intel(&self, report: &IntelReport) {
        let summary = truncate(&report.summary(), 100);
        if report.is_fetched() {
            eprintln!("  {} {summary}", "✓".green().bold());
        } else {
            eprintln!("  {} {}", "✗".red().bold(), summary.red());
        }
    }

    /// Print the self-update outcome; nothing for a no-op
    pub fn print_update(&self, outcome: &UpdateOutcome) {
        if let Some(line) = summarize_update(outcome) {
            match outcome {
                UpdateOutcome::Applied { .. } => eprintln!("  {} {line}", "▶".blue()),
                _ => eprintln!("  {} {}", "⚠".yellow().bold(), line.yellow()),
            }
        }
    }

    /// Print the reflection body to stdout
    pub fn print_reflection(&self, body: &str) {
        eprintln!("{}", "─".repeat(50).dimmed());
        println!("{body}");
    }
}

/// Announce that a staged definition was swapped in at startup
pub fn print_promoted() {
    eprintln!(
        "{} {}",
        "▶".blue(),
        "Staged behavior definition promoted".bold()
    );
}

/// Notice printed when the operator interrupts the loop
pub fn print_exit() {
    println!("\nExiting...");
}

/// One-line description of an update outcome, `None` for a no-op
#[must_use]
pub fn summarize_update(outcome: &UpdateOutcome) -> Option<String> {
    match outcome {
        UpdateOutcome::NoOp => None,
        UpdateOutcome::Rejected { reason } => Some(reason.clone()),
        UpdateOutcome::Applied { backup, staged } => Some(format!(
            "Update staged at {} (backup: {})",
            staged.display(),
            backup.display()
        )),
    }
}

/// Shorten `text` to at most `max` characters, marking the cut with `...`
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let kept: String = text.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}
