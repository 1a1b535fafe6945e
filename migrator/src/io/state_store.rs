//! Persisted state file load/save.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::state::VersionedState;

/// Load a versioned state from a JSON file.
pub fn load_state(path: &Path) -> Result<VersionedState> {
    debug!(path = %path.display(), "loading state");
    let contents =
        fs::read_to_string(path).with_context(|| format!("read state {}", path.display()))?;
    let state: VersionedState = serde_json::from_str(&contents)
        .with_context(|| format!("parse state {}", path.display()))?;
    debug!(version = state.version(), "state loaded");
    Ok(state)
}

/// Atomically write state to disk (temp file + rename).
pub fn write_state(path: &Path, state: &VersionedState) -> Result<()> {
    debug!(path = %path.display(), version = state.version(), "writing state");
    let mut buf = serde_json::to_string_pretty(state)?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    let parent = path
        .parent()
        .with_context(|| format!("state path missing parent {}", path.display()))?;
    fs::create_dir_all(parent).with_context(|| format!("create directory {}", parent.display()))?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp state {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace state {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::state_from;
    use serde_json::json;

    #[test]
    fn write_then_load_preserves_payload() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nested").join("state.json");
        let state = state_from(json!({ "version": 3, "wallets": [{ "id": "w1" }] }));

        write_state(&path, &state).expect("write");
        let loaded = load_state(&path).expect("load");

        assert_eq!(loaded, state);
        assert!(!path.with_extension("json.tmp").exists());
    }

    /// Output is pretty-printed with a trailing newline.
    #[test]
    fn written_format_is_stable() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("state.json");
        write_state(&path, &state_from(json!({ "version": 1 }))).expect("write");
        let contents = fs::read_to_string(&path).expect("read");
        assert_eq!(contents, "{\n  \"version\": 1\n}\n");
    }

    #[test]
    fn load_rejects_non_object_state() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("state.json");
        fs::write(&path, "[]").expect("write");
        let err = load_state(&path).expect_err("array state");
        let message = format!("{:#}", err);
        assert!(message.contains("parse state"));
        assert!(message.contains("JSON object"));
    }

    /// A previously migrated file with a float tag must not load as version 0.
    #[test]
    fn load_rejects_malformed_version() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("state.json");
        fs::write(&path, "{\"version\": 3.0, \"enabledAssets\": {}}").expect("write");
        let err = load_state(&path).expect_err("float version");
        assert!(format!("{:#}", err).contains("non-negative integer"));
    }

    #[test]
    fn load_missing_file_names_path() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("absent.json");
        let err = load_state(&path).expect_err("missing");
        assert!(err.to_string().contains("absent.json"));
    }
}
