//! Operator input
//!
//! Once per cycle the operator may leave a message. A blank line or a
//! closed input stream both mean "no message".

use std::collections::VecDeque;
use std::io::{BufRead, Write as IoWrite};
use std::sync::Mutex;

use anyhow::{Context, Result};
use async_trait::async_trait;

/// Prompt shown before reading the operator's message
pub const PROMPT: &str = "Message to Jayce (leave blank to continue): ";

/// Source of one line of operator text per cycle
#[async_trait]
pub trait OperatorInput: Send + Sync {
    /// Show `prompt` and wait for one line. `Ok(None)` means end of input.
    async fn read_line(&self, prompt: &str) -> Result<Option<String>>;
}

/// Reads from the process's stdin without blocking the async runtime
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinOperator;

#[async_trait]
impl OperatorInput for StdinOperator {
    async fn read_line(&self, prompt: &str) -> Result<Option<String>> {
        let prompt = prompt.to_string();
        tokio::task::spawn_blocking(move || -> Result<Option<String>> {
            let mut stderr = std::io::stderr();
            write!(stderr, "{prompt}").context("Failed to write prompt")?;
            stderr.flush().context("Failed to flush prompt")?;

            let mut line = String::new();
            let read = std::io::stdin()
                .lock()
                .read_line(&mut line)
                .context("Failed to read operator input")?;
            Ok((read > 0).then_some(line))
        })
        .await
        .context("stdin reader panicked")?
    }
}

/// Replays a fixed sequence of lines, then reports end of input
#[derive(Debug, Default)]
pub struct ScriptedOperator {
    lines: Mutex<VecDeque<String>>,
}

impl ScriptedOperator {
    /// Operator that will answer with `lines`, in order
    #[must_use]
    pub fn new<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: Mutex::new(lines.into_iter().map(Into::into).collect()),
        }
    }

    /// Operator whose input is already closed
    #[must_use]
    pub fn closed() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OperatorInput for ScriptedOperator {
    async fn read_line(&self, _prompt: &str) -> Result<Option<String>> {
        let mut lines = self
            .lines
            .lock()
            .map_err(|_| anyhow::anyhow!("scripted operator lock poisoned"))?;
        Ok(lines.pop_front())
    }
}

/// Reduce a raw input line to a message, or `None` if it is blank.
#[must_use]
pub fn normalize_message(raw: Option<String>) -> Option<String> {
    let line = raw?;
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        None
    } else {
        Some(line.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_line_ending() {
        assert_eq!(
            normalize_message(Some("hello\r\n".to_string())).as_deref(),
            Some("hello")
        );
    }

    #[test]
    fn test_normalize_keeps_inner_spacing() {
        assert_eq!(
            normalize_message(Some("  two  words \n".to_string())).as_deref(),
            Some("  two  words ")
        );
    }

    #[test]
    fn test_blank_and_closed_input_mean_no_message() {
        assert_eq!(normalize_message(None), None);
        assert_eq!(normalize_message(Some("\n".to_string())), None);
        assert_eq!(normalize_message(Some("   \t\n".to_string())), None);
    }

    #[tokio::test]
    async fn test_scripted_operator_replays_then_closes() {
        let operator = ScriptedOperator::new(["first", ""]);

        assert_eq!(
            operator.read_line(PROMPT).await.unwrap().as_deref(),
            Some("first")
        );
        assert_eq!(operator.read_line(PROMPT).await.unwrap().as_deref(), Some(""));
        assert_eq!(operator.read_line(PROMPT).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_closed_operator_has_no_input() {
        assert_eq!(ScriptedOperator::closed().read_line(PROMPT).await.unwrap(), None);
    }
}
