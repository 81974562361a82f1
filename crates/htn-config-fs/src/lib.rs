// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Filesystem-backed [`ConfigStore`] for planner settings.
//!
//! Each key maps to `<base>/<key>.json`. Keys are restricted to ASCII
//! letters, digits, `-` and `_` so a key can never name a path outside the
//! base directory. Saves go through a sibling temp file and a rename, so a
//! reader sees either the old document or the new one.

use std::ffi::OsStr;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use htn_planner::{ConfigError, ConfigStore};

const EXTENSION: &str = "json";

/// JSON settings files under one directory.
#[derive(Debug, Clone)]
pub struct FsConfigStore {
    base: PathBuf,
}

impl FsConfigStore {
    /// Store under the user config directory (`~/.config/htn-planner` on Linux).
    pub fn new() -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from("dev", "flyingrobots", "htn-planner")
            .ok_or_else(|| ConfigError::Other("no home directory for settings".into()))?;
        Self::with_base(dirs.config_dir())
    }

    /// Store under `base`, creating the directory if needed.
    pub fn with_base(base: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let base = base.as_ref().to_path_buf();
        fs::create_dir_all(&base)?;
        Ok(Self { base })
    }

    /// Directory holding the settings files.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Keys currently stored, sorted.
    pub fn keys(&self) -> Result<Vec<String>, ConfigError> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.base)? {
            let path = entry?.path();
            if path.extension() != Some(OsStr::new(EXTENSION)) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(OsStr::to_str) {
                if valid_key(stem) {
                    keys.push(stem.to_owned());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, ConfigError> {
        if !valid_key(key) {
            return Err(ConfigError::Other(format!("invalid settings key {key:?}")));
        }
        Ok(self.base.join(key).with_extension(EXTENSION))
    }
}

fn valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        match fs::read(self.path_for(key)?) {
            Err(err) if err.kind() == ErrorKind::NotFound => Err(ConfigError::NotFound),
            other => other.map_err(ConfigError::from),
        }
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let path = self.path_for(key)?;
        let staging = path.with_extension("json.tmp");
        fs::write(&staging, data)?;
        if let Err(err) = fs::rename(&staging, &path) {
            let _ = fs::remove_file(&staging);
            return Err(err.into());
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use htn_planner::{ConfigService, ExecutorConfig, PlannerConfig};

    fn store() -> (tempfile::TempDir, FsConfigStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsConfigStore::with_base(dir.path().join("settings")).unwrap();
        (dir, store)
    }

    #[test]
    fn missing_file_is_not_found() {
        let (_dir, store) = store();
        assert!(matches!(store.load_raw("planner"), Err(ConfigError::NotFound)));
    }

    #[test]
    fn settings_round_trip_through_json_files() {
        let (_dir, store) = store();
        let base = store.base().to_path_buf();
        let service = ConfigService::new(store);
        let cfg = PlannerConfig {
            max_iterations: Some(10_000),
        };
        service.save("planner", &cfg).unwrap();
        assert!(base.join("planner.json").exists());
        assert!(!base.join("planner.json.tmp").exists());

        let loaded: PlannerConfig = service.load_or_default("planner").unwrap();
        assert_eq!(loaded, cfg);
        let exec: ExecutorConfig = service.load_or_default("executor").unwrap();
        assert_eq!(exec, ExecutorConfig::default());
    }

    #[test]
    fn save_replaces_the_previous_document() {
        let (_dir, store) = store();
        store.save_raw("executor", br#"{"seed": 1}"#).unwrap();
        store.save_raw("executor", br#"{"seed": 2}"#).unwrap();
        assert_eq!(store.load_raw("executor").unwrap(), br#"{"seed": 2}"#.to_vec());
    }

    #[test]
    fn keys_that_could_escape_the_base_are_rejected() {
        let (_dir, store) = store();
        for key in ["", "../planner", "a/b", "a.b"] {
            assert!(
                matches!(store.save_raw(key, b"{}"), Err(ConfigError::Other(_))),
                "key = {key:?}"
            );
            assert!(matches!(store.load_raw(key), Err(ConfigError::Other(_))));
        }
        assert!(store.keys().unwrap().is_empty());
    }

    #[test]
    fn keys_lists_stored_settings_only() {
        let (_dir, store) = store();
        store.save_raw("planner", b"{}").unwrap();
        store.save_raw("executor", b"{}").unwrap();
        fs::write(store.base().join("notes.txt"), b"ignored").unwrap();
        assert_eq!(store.keys().unwrap(), vec!["executor", "planner"]);
    }
}
