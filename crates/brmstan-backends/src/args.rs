//! Backend keyword arguments.
//!
//! The caller passes sampler options as free-form keyword arguments. A few
//! are understood by every backend under several spellings (`chains` /
//! `num_chains`, `iter_sampling` / `num_samples`, ...); the rest pass
//! through to the backend untouched.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{BackendError, Result};

/// Default number of chains.
pub const DEFAULT_CHAINS: usize = 4;

const CHAINS_KEYS: &[&str] = &["chains", "num_chains"];
const WARMUP_KEYS: &[&str] = &["iter_warmup", "num_warmup", "warmup"];
const SAMPLES_KEYS: &[&str] = &["iter_sampling", "num_samples"];
const SEED_KEYS: &[&str] = &["seed", "random_seed"];

/// Ordered keyword arguments for a backend's sampling call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleArgs(IndexMap<String, Value>);

impl SampleArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an argument, builder style.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse `key=value`; the value is read as JSON when it parses, else as a string.
    pub fn parse_pair(pair: &str) -> Result<(String, Value)> {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| BackendError::InvalidArgument {
                key: pair.to_string(),
                detail: "expected key=value".to_string(),
            })?;
        let key = key.trim();
        if key.is_empty() {
            return Err(BackendError::InvalidArgument {
                key: pair.to_string(),
                detail: "empty key".to_string(),
            });
        }
        let raw = raw.trim();
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        Ok((key.to_string(), value))
    }

    /// Number of chains (default 4).
    pub fn chains(&self) -> Result<usize> {
        Ok(self.unsigned(CHAINS_KEYS)?.map_or(DEFAULT_CHAINS, |n| n as usize))
    }

    /// Warmup iterations per chain, if given.
    pub fn num_warmup(&self) -> Result<Option<u64>> {
        self.unsigned(WARMUP_KEYS)
    }

    /// Post-warmup draws per chain, if given.
    pub fn num_samples(&self) -> Result<Option<u64>> {
        self.unsigned(SAMPLES_KEYS)
    }

    /// Random seed, if given.
    pub fn seed(&self) -> Result<Option<u64>> {
        self.unsigned(SEED_KEYS)
    }

    /// Arguments that are not one of the common options, in order.
    pub fn extra(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0
            .iter()
            .filter(|(k, _)| !is_common(k))
            .map(|(k, v)| (k.as_str(), v))
    }

    fn unsigned(&self, keys: &[&str]) -> Result<Option<u64>> {
        let Some((key, value)) = keys
            .iter()
            .find_map(|k| self.0.get(*k).map(|v| (*k, v)))
        else {
            return Ok(None);
        };
        value
            .as_u64()
            .map(Some)
            .ok_or_else(|| BackendError::InvalidArgument {
                key: key.to_string(),
                detail: format!("expected a non-negative integer, got {value}"),
            })
    }
}

fn is_common(key: &str) -> bool {
    [CHAINS_KEYS, WARMUP_KEYS, SAMPLES_KEYS, SEED_KEYS]
        .iter()
        .any(|keys| keys.contains(&key))
}

/// Render a JSON value as a bare command-line token.
pub(crate) fn value_token(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => u8::from(*b).to_string(),
        other => other.to_string(),
    }
}

impl FromIterator<(String, Value)> for SampleArgs {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
