// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Planner and executor settings, plus the storage port used to persist them.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;

/// Search settings.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    /// Upper bound on refinement-loop iterations per `plan`/`replan` call.
    ///
    /// `None` searches without bound; a domain whose methods recurse with no
    /// base case will then never return.
    pub max_iterations: Option<usize>,
}

/// Monte Carlo executor settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Seed for the outcome sampler.
    pub seed: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self { seed: 10 }
    }
}

/// Where serialized settings live. Keys are logical names such as
/// `"planner"` or `"executor"`; the store never interprets the bytes.
pub trait ConfigStore {
    /// Bytes stored under `key`, or [`ConfigError::NotFound`].
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Replaces whatever is stored under `key`.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Failure while reading or writing settings.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Nothing stored under the key.
    #[error("settings not found")]
    NotFound,
    /// The backing store failed.
    #[error("settings i/o: {0}")]
    Io(#[from] std::io::Error),
    /// Stored bytes are not valid JSON for the requested type.
    #[error("settings json: {0}")]
    Serde(#[from] serde_json::Error),
    /// Store-specific failure.
    #[error("settings store: {0}")]
    Other(String),
}

/// Serializes settings as JSON and delegates storage to a [`ConfigStore`].
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Wraps `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Unwraps the store.
    pub fn into_inner(self) -> S {
        self.store
    }
}

impl<S> ConfigService<S>
where
    S: ConfigStore,
{
    /// Reads `key`. Missing and empty entries both yield `Ok(None)`.
    pub fn load<T>(&self, key: &str) -> Result<Option<T>, ConfigError>
    where
        T: DeserializeOwned,
    {
        match self.store.load_raw(key) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(ConfigError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Load `key`, falling back to `T::default()` when it is missing.
    pub fn load_or_default<T>(&self, key: &str) -> Result<T, ConfigError>
    where
        T: DeserializeOwned + Default,
    {
        Ok(self.load(key)?.unwrap_or_default())
    }

    /// Writes `value` under `key` as pretty JSON.
    pub fn save<T>(&self, key: &str, value: &T) -> Result<(), ConfigError>
    where
        T: Serialize,
    {
        let data = serde_json::to_vec_pretty(value)?;
        self.store.save_raw(key, &data)
    }
}
