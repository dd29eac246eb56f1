//! Process supervision
//!
//! Accepted updates are staged, never applied to the running process.
//! Before the first cycle of a new process, the staged definition is
//! moved over the live one.

use anyhow::{Context, Result};

use crate::cycle::config::LoopPaths;
use crate::log::Journal;

/// Swap a staged behavior definition into place.
///
/// Returns `false` when nothing was staged.
pub fn promote_staged(paths: &LoopPaths) -> Result<bool> {
    if !paths.staging.exists() {
        return Ok(false);
    }

    if let Some(dir) = paths.behavior.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }
    std::fs::rename(&paths.staging, &paths.behavior).with_context(|| {
        format!(
            "Failed to promote {} -> {}",
            paths.staging.display(),
            paths.behavior.display()
        )
    })?;

    Journal::new(&paths.logs)?.record_update("staged update promoted")?;
    tracing::info!(behavior = %paths.behavior.display(), "staged update promoted");

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::read_lines;
    use tempfile::TempDir;

    #[test]
    fn test_nothing_staged_is_noop() {
        let tmp = TempDir::new().unwrap();
        let paths = LoopPaths::under(tmp.path());
        std::fs::write(&paths.behavior, "v1").unwrap();

        assert!(!promote_staged(&paths).unwrap());
        assert_eq!(std::fs::read_to_string(&paths.behavior).unwrap(), "v1");
        assert!(!paths.logs.exists());
    }

    #[test]
    fn test_staged_definition_replaces_live_one() {
        let tmp = TempDir::new().unwrap();
        let paths = LoopPaths::under(tmp.path());
        std::fs::write(&paths.behavior, "v1").unwrap();
        std::fs::write(&paths.staging, "v2: Serve Jayce").unwrap();

        assert!(promote_staged(&paths).unwrap());

        assert_eq!(
            std::fs::read_to_string(&paths.behavior).unwrap(),
            "v2: Serve Jayce"
        );
        assert!(!paths.staging.exists());
        let updates = read_lines(&paths.logs.join("updates.log")).unwrap();
        assert_eq!(updates.len(), 1);
        assert!(updates[0].ends_with("UTC: staged update promoted"));
    }

    #[test]
    fn test_promotion_creates_missing_live_definition() {
        let tmp = TempDir::new().unwrap();
        let paths = LoopPaths::under(tmp.path());
        std::fs::write(&paths.staging, "fresh").unwrap();

        assert!(promote_staged(&paths).unwrap());
        assert_eq!(std::fs::read_to_string(&paths.behavior).unwrap(), "fresh");
    }
}
