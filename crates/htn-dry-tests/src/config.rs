// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! In-memory config store fake for planner settings.

use htn_planner::{ConfigError, ConfigStore};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

/// In-memory [`ConfigStore`] that records how often it was used.
///
/// Clones share storage, so a test can hand one clone to a
/// `ConfigService` and inspect the other.
///
/// # Example
///
/// ```
/// use htn_dry_tests::InMemoryConfigStore;
/// use htn_planner::{ConfigService, PlannerConfig};
///
/// let store = InMemoryConfigStore::new();
/// let service = ConfigService::new(store.clone());
///
/// let cfg = PlannerConfig { max_iterations: Some(64) };
/// service.save("planner", &cfg).unwrap();
/// assert_eq!(store.save_count(), 1);
/// assert!(store.contains_key("planner"));
/// ```
#[derive(Clone, Default)]
pub struct InMemoryConfigStore {
    inner: Arc<Mutex<Inner>>,
}

#[derive(Default)]
struct Inner {
    data: BTreeMap<String, Vec<u8>>,
    loads: usize,
    saves: usize,
    fail_on_load: bool,
}

impl InMemoryConfigStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding one raw document under `key`.
    pub fn with_document(key: &str, json: &str) -> Self {
        let store = Self::new();
        store.lock().data.insert(key.to_owned(), json.as_bytes().to_vec());
        store
    }

    /// Make every subsequent load fail with [`ConfigError::Other`].
    pub fn set_fail_on_load(&self, fail: bool) {
        self.lock().fail_on_load = fail;
    }

    /// Number of `load_raw` attempts, failed ones included.
    pub fn load_count(&self) -> usize {
        self.lock().loads
    }

    /// Number of `save_raw` calls.
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    /// Check if a key exists in the store.
    pub fn contains_key(&self, key: &str) -> bool {
        self.lock().data.contains_key(key)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        let mut inner = self.lock();
        inner.loads += 1;
        if inner.fail_on_load {
            return Err(ConfigError::Other("simulated load failure".into()));
        }
        inner.data.get(key).cloned().ok_or(ConfigError::NotFound)
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let mut inner = self.lock();
        inner.saves += 1;
        inner.data.insert(key.to_owned(), data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use htn_planner::{ConfigService, ExecutorConfig, PlannerConfig};

    #[test]
    fn clones_share_storage() {
        let a = InMemoryConfigStore::new();
        let b = a.clone();
        a.save_raw("k", b"{}").unwrap();
        assert!(b.contains_key("k"));
        assert_eq!(b.save_count(), 1);
    }

    #[test]
    fn seeded_document_is_loaded_with_defaults_for_missing_fields() {
        let store = InMemoryConfigStore::with_document("executor", r#"{"seed": 42}"#);
        let service = ConfigService::new(store.clone());
        let exec: ExecutorConfig = service.load_or_default("executor").unwrap();
        assert_eq!(exec.seed, 42);
        let planner: PlannerConfig = service.load_or_default("planner").unwrap();
        assert_eq!(planner, PlannerConfig::default());
        assert_eq!(store.load_count(), 2);
    }

    #[test]
    fn load_failure_propagates() {
        let store = InMemoryConfigStore::new();
        store.set_fail_on_load(true);
        let service = ConfigService::new(store);
        let res: Result<Option<PlannerConfig>, _> = service.load("planner");
        assert!(matches!(res, Err(ConfigError::Other(_))));
    }

    #[test]
    fn saved_json_is_readable() {
        let store = InMemoryConfigStore::new();
        let service = ConfigService::new(store.clone());
        service
            .save("planner", &PlannerConfig { max_iterations: Some(3) })
            .unwrap();
        let raw = store.load_raw("planner").unwrap();
        let v: serde_json::Value = serde_json::from_slice(&raw).unwrap();
        assert_eq!(v["max_iterations"], 3);
    }
}
