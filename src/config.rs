//! Engine configuration.
//!
//! Every field has a default, so a JSON config file only needs the keys it changes:
//!
//! ```json
//! { "timeout_ms": 2000, "policy": { "max_source_length": 20000 } }
//! ```

use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::policy::PolicyConfig;
use crate::runtime::Limits;

/// Default wall-clock budget for one evaluation.
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Stack reserved for the sandbox thread.
pub const DEFAULT_SANDBOX_STACK_SIZE: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Budget for a whole evaluation (learner code plus tests)
    pub timeout_ms: u64,
    /// Script call frames before `RangeError: Maximum call stack size exceeded`
    pub max_call_depth: usize,
    /// Longest string a script may build, in UTF-16 code units
    pub max_string_len: usize,
    pub max_array_len: usize,
    pub max_objects: usize,
    pub sandbox_stack_size: usize,
    pub policy: PolicyConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let limits = Limits::default();
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            max_call_depth: limits.max_call_depth,
            max_string_len: limits.max_string_len,
            max_array_len: limits.max_array_len,
            max_objects: limits.max_objects,
            sandbox_stack_size: DEFAULT_SANDBOX_STACK_SIZE,
            policy: PolicyConfig::default(),
        }
    }
}

/// Errors reading a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config '{path}': {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ConfigError::Json {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_max_string_len(mut self, len: usize) -> Self {
        self.max_string_len = len;
        self
    }

    pub fn with_max_array_len(mut self, len: usize) -> Self {
        self.max_array_len = len;
        self
    }

    pub fn with_sandbox_stack_size(mut self, bytes: usize) -> Self {
        self.sandbox_stack_size = bytes;
        self
    }

    pub fn with_policy(mut self, policy: PolicyConfig) -> Self {
        self.policy = policy;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Interpreter limits for a run that started at `start` with the given budget.
    pub fn limits(&self, start: Instant, budget: Duration) -> Limits {
        Limits {
            max_call_depth: self.max_call_depth,
            max_string_len: self.max_string_len,
            max_array_len: self.max_array_len,
            max_objects: self.max_objects,
            deadline: start.checked_add(budget),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.timeout_ms, 5000);
        assert_eq!(config.max_call_depth, 256);
        assert_eq!(config.sandbox_stack_size, 64 * 1024 * 1024);
        assert_eq!(config.policy.max_source_length, 100_000);
    }

    #[test]
    fn test_builder() {
        let config = EngineConfig::new().with_timeout_ms(250).with_max_call_depth(32);
        assert_eq!(config.timeout(), Duration::from_millis(250));
        assert_eq!(config.max_call_depth, 32);
    }

    #[test]
    fn test_partial_json() {
        let config = EngineConfig::from_json(r#"{ "timeout_ms": 2000, "policy": { "max_source_length": 50 } }"#)
            .expect("config should parse");
        assert_eq!(config.timeout_ms, 2000);
        assert_eq!(config.policy.max_source_length, 50);
        assert_eq!(config.policy.rules, None);
        assert_eq!(config.max_call_depth, 256);
    }

    #[test]
    fn test_limits_carry_deadline() {
        let start = Instant::now();
        let limits = EngineConfig::default().limits(start, Duration::from_millis(10));
        assert_eq!(limits.deadline, Some(start + Duration::from_millis(10)));
    }
}
