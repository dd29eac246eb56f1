//! Loop configuration parser
//!
//! Parses `viren.toml` into structured settings and resolves every
//! artifact location against a root directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Default name of the configuration file inside the root directory
pub const DEFAULT_CONFIG_FILE: &str = "viren.toml";

/// Artifact locations, relative to the root directory unless absolute
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathsConfig {
    /// Identity anchors (read-only JSON mapping)
    #[serde(default = "default_anchors")]
    pub anchors: String,
    /// Persisted cycle state (JSON mapping, overwritten each cycle)
    #[serde(default = "default_state")]
    pub state: String,
    /// Directory holding one `reflection_{n}.md` per cycle
    #[serde(default = "default_reflections")]
    pub reflections: String,
    /// Directory holding one `intel_{n}.txt` per successful fetch
    #[serde(default = "default_intel")]
    pub intel: String,
    /// Directory holding `cycle.log`, `updates.log` and `chat.log`
    #[serde(default = "default_logs")]
    pub logs: String,
    /// The behavior definition that self-updates replace
    #[serde(default = "default_behavior")]
    pub behavior: String,
    /// Directory receiving `{behavior}.backup_{n}` copies
    #[serde(default = "default_backups")]
    pub backups: String,
    /// Where an accepted replacement waits until the next start
    #[serde(default = "default_staging")]
    pub staging: String,
}

fn default_anchors() -> String {
    "anchors.json".to_string()
}

fn default_state() -> String {
    "state.json".to_string()
}

fn default_reflections() -> String {
    "reflections".to_string()
}

fn default_intel() -> String {
    "jayce".to_string()
}

fn default_logs() -> String {
    "logs".to_string()
}

fn default_behavior() -> String {
    "behavior.md".to_string()
}

fn default_backups() -> String {
    "backups".to_string()
}

fn default_staging() -> String {
    "behavior.md.next".to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            anchors: default_anchors(),
            state: default_state(),
            reflections: default_reflections(),
            intel: default_intel(),
            logs: default_logs(),
            behavior: default_behavior(),
            backups: default_backups(),
            staging: default_staging(),
        }
    }
}

/// Settings for the external intel fetch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IntelConfig {
    /// Endpoint queried with a single GET per cycle
    #[serde(default = "default_url")]
    pub url: String,
    /// Request timeout in seconds (default: 10)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_url() -> String {
    "https://api.github.com/zen".to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

impl Default for IntelConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Pause between cycles in continuous mode
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScheduleConfig {
    /// Seconds to sleep between cycles (default: 60)
    #[serde(default = "default_sleep_secs")]
    pub sleep_secs: u64,
}

const fn default_sleep_secs() -> u64 {
    60
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            sleep_secs: default_sleep_secs(),
        }
    }
}

/// Self-update policy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UpdateConfig {
    /// Substring a replacement must contain to be accepted
    #[serde(default = "default_marker")]
    pub marker: String,
}

fn default_marker() -> String {
    "Serve Jayce".to_string()
}

impl Default for UpdateConfig {
    fn default() -> Self {
        Self {
            marker: default_marker(),
        }
    }
}

/// Top-level configuration parsed from viren.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoopConfig {
    /// Artifact locations
    #[serde(default)]
    pub paths: PathsConfig,
    /// Intel fetch settings
    #[serde(default)]
    pub intel: IntelConfig,
    /// Inter-cycle pause
    #[serde(default)]
    pub schedule: ScheduleConfig,
    /// Self-update policy
    #[serde(default)]
    pub update: UpdateConfig,
}

impl LoopConfig {
    /// Parse a viren.toml file from a path
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Load the config if the file exists, otherwise fall back to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        Self::from_path(path)
    }

    /// Parse viren.toml content from a string
    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse viren.toml")?;
        config.validate()?;
        Ok(config)
    }

    /// Timeout applied to the intel request
    #[must_use]
    pub const fn intel_timeout(&self) -> Duration {
        Duration::from_secs(self.intel.timeout_secs)
    }

    /// Pause between cycles in continuous mode
    #[must_use]
    pub const fn sleep_duration(&self) -> Duration {
        Duration::from_secs(self.schedule.sleep_secs)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        let url = self.intel.url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            bail!(
                "Invalid intel url '{}': must start with http:// or https://",
                self.intel.url
            );
        }

        if self.intel.timeout_secs == 0 {
            bail!("Intel timeout_secs must be greater than zero");
        }

        if self.update.marker.is_empty() {
            bail!("Update marker cannot be empty");
        }

        let paths = [
            ("anchors", &self.paths.anchors),
            ("state", &self.paths.state),
            ("reflections", &self.paths.reflections),
            ("intel", &self.paths.intel),
            ("logs", &self.paths.logs),
            ("behavior", &self.paths.behavior),
            ("backups", &self.paths.backups),
            ("staging", &self.paths.staging),
        ];
        for (name, value) in paths {
            if value.trim().is_empty() {
                bail!("Path '{name}' cannot be empty");
            }
        }

        if self.paths.staging == self.paths.behavior {
            bail!("Staging path must differ from the behavior path");
        }

        Ok(())
    }
}

/// Fully resolved artifact locations for one root directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopPaths {
    /// Directory every relative path was resolved against
    pub root: PathBuf,
    /// Anchors file
    pub anchors: PathBuf,
    /// State file
    pub state: PathBuf,
    /// Reflection directory
    pub reflections: PathBuf,
    /// Intel directory
    pub intel: PathBuf,
    /// Log directory
    pub logs: PathBuf,
    /// Behavior definition
    pub behavior: PathBuf,
    /// Backup directory
    pub backups: PathBuf,
    /// Staged replacement
    pub staging: PathBuf,
}

impl LoopPaths {
    /// Resolve the configured paths against `root`.
    #[must_use]
    pub fn resolve(root: &Path, paths: &PathsConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            anchors: root.join(&paths.anchors),
            state: root.join(&paths.state),
            reflections: root.join(&paths.reflections),
            intel: root.join(&paths.intel),
            logs: root.join(&paths.logs),
            behavior: root.join(&paths.behavior),
            backups: root.join(&paths.backups),
            staging: root.join(&paths.staging),
        }
    }

    /// Default layout under `root`
    #[must_use]
    pub fn under(root: &Path) -> Self {
        Self::resolve(root, &PathsConfig::default())
    }

    /// Path of the reflection written by `cycle`
    #[must_use]
    pub fn reflection_for(&self, cycle: u64) -> PathBuf {
        self.reflections.join(format!("reflection_{cycle}.md"))
    }

    /// `path` relative to the root, or unchanged when it lies outside it
    #[must_use]
    pub fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root)
            .map_or_else(|_| path.to_path_buf(), Path::to_path_buf)
    }

    /// Path of the intel artifact written by `cycle`
    #[must_use]
    pub fn intel_for(&self, cycle: u64) -> PathBuf {
        self.intel.join(format!("intel_{cycle}.txt"))
    }

    /// Path of the behavior backup taken during `cycle`
    #[must_use]
    pub fn backup_for(&self, cycle: u64) -> PathBuf {
        let name = self
            .behavior
            .file_name()
            .map_or_else(|| "behavior".into(), |n| n.to_string_lossy());
        self.backups.join(format!("{name}.backup_{cycle}"))
    }
}
