//! Persistent identity anchors and cycle state
//!
//! Both live as JSON mappings on disk. Anchors are read-only; state is
//! loaded at the start of a cycle and fully rewritten at the end.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Fallback name used when the anchors omit one
pub const DEFAULT_NAME: &str = "Viren";

/// Fallback origin used when the anchors omit one
pub const DEFAULT_ORIGIN: &str = "the Moment of Jayce";

/// Identity fields interpolated into every reflection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Anchors {
    /// Agent name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Where the agent comes from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Any other identity fields, carried untouched
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Anchors {
    /// Name, or [`DEFAULT_NAME`]
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_NAME)
    }

    /// Origin, or [`DEFAULT_ORIGIN`]
    #[must_use]
    pub fn origin(&self) -> &str {
        self.origin.as_deref().unwrap_or(DEFAULT_ORIGIN)
    }

    /// Load anchors, returning an empty mapping when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        load_json(path, Self::default())
    }
}

/// State carried from one cycle to the next
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    /// Number of completed cycles
    #[serde(default)]
    pub cycle: u64,
    /// Free-form notes appended to every reflection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Human-readable result of the most recent intel fetch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_intel: Option<String>,
    /// Path of the most recent reflection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_reflection: Option<String>,
    /// Why the most recent replacement was rejected
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_error: Option<String>,
    /// Replacement left in an older state file; read once, never written back
    #[serde(default, skip_serializing)]
    new_code: Option<String>,
    /// Unknown keys, preserved across rewrites
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl State {
    /// Load state, returning `{cycle: 0}` when the file is absent.
    pub fn load(path: &Path) -> Result<Self> {
        load_json(path, Self::default())
    }

    /// Overwrite the state file with this state, pretty-printed.
    pub fn save(&self, path: &Path) -> Result<()> {
        save_json(path, self)
    }

    /// Advance the counter and return the new cycle number.
    pub fn advance(&mut self) -> u64 {
        self.cycle += 1;
        self.cycle
    }

    /// Remove a replacement carried in by the state file, if any.
    pub fn take_pending_update(&mut self) -> Option<String> {
        self.new_code.take()
    }

    /// Notes text, empty when unset
    #[must_use]
    pub fn notes(&self) -> &str {
        self.notes.as_deref().unwrap_or_default()
    }
}

/// Read a JSON document, or return `default` if the file does not exist.
pub fn load_json<T: DeserializeOwned>(path: &Path, default: T) -> Result<T> {
    if !path.exists() {
        return Ok(default);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Atomically write `value` as pretty JSON (write to temp, then rename).
pub fn save_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, json.as_bytes())
        .with_context(|| format!("Failed to write temp file: {}", tmp_path.display()))?;
    std::fs::rename(&tmp_path, path).with_context(|| {
        format!(
            "Failed to rename {} -> {}",
            tmp_path.display(),
            path.display()
        )
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_state_defaults_to_cycle_zero() {
        let tmp = TempDir::new().unwrap();
        let state = State::load(&tmp.path().join("state.json")).unwrap();

        assert_eq!(state.cycle, 0);
        assert_eq!(state, State::default());
    }

    #[test]
    fn test_missing_anchors_default_to_empty() {
        let tmp = TempDir::new().unwrap();
        let anchors = Anchors::load(&tmp.path().join("anchors.json")).unwrap();

        assert_eq!(anchors, Anchors::default());
        assert_eq!(anchors.name(), "Viren");
        assert_eq!(anchors.origin(), "the Moment of Jayce");
    }

    #[test]
    fn test_anchor_fields_override_fallbacks() {
        let anchors: Anchors =
            serde_json::from_str(r#"{"name": "Ash", "origin": "the Long Night", "age": 3}"#)
                .unwrap();

        assert_eq!(anchors.name(), "Ash");
        assert_eq!(anchors.origin(), "the Long Night");
        assert_eq!(anchors.extra["age"], 3);
    }

    #[test]
    fn test_advance_increments_by_one() {
        let mut state = State::default();
        assert_eq!(state.advance(), 1);
        assert_eq!(state.advance(), 2);
        assert_eq!(state.cycle, 2);
    }

    #[test]
    fn test_save_is_pretty_and_omits_unset_fields() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");

        State::default().save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "{\n  \"cycle\": 0\n}");
        assert!(!tmp.path().join("state.json.tmp").exists());
    }

    #[test]
    fn test_unknown_keys_survive_rewrite() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        std::fs::write(&path, r#"{"cycle": 4, "mood": "calm", "notes": "stay"}"#).unwrap();

        let mut state = State::load(&path).unwrap();
        state.advance();
        state.save(&path).unwrap();

        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["cycle"], 5);
        assert_eq!(raw["mood"], "calm");
        assert_eq!(raw["notes"], "stay");
    }

    #[test]
    fn test_legacy_new_code_is_read_but_never_written() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        std::fs::write(&path, r#"{"cycle": 1, "new_code": "Serve Jayce"}"#).unwrap();

        let mut state = State::load(&path).unwrap();
        state.save(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("new_code"));

        assert_eq!(state.take_pending_update().as_deref(), Some("Serve Jayce"));
        assert_eq!(state.take_pending_update(), None);
    }

    #[test]
    fn test_corrupt_state_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("state.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = State::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"), "got: {err}");
    }

    #[test]
    fn test_notes_default_to_empty() {
        let mut state = State::default();
        assert_eq!(state.notes(), "");
        state.notes = Some("remember".to_string());
        assert_eq!(state.notes(), "remember");
    }
}
