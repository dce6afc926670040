//! Engine configuration.
//!
//! Values come from defaults, a JSON document, or the process environment:
//!
//! ```rust
//! use appflow::config::EngineConfig;
//!
//! let config = EngineConfig::from_json_str(r#"{ "max_microsteps": 16 }"#).unwrap();
//! assert_eq!(config.max_microsteps, 16);
//! assert_eq!(config.history_limit, Some(128));
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MAX_MICROSTEPS_VAR: &str = "APPFLOW_MAX_MICROSTEPS";
pub const HISTORY_LIMIT_VAR: &str = "APPFLOW_HISTORY_LIMIT";

/// Errors that can occur while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config document: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value '{value}' for {var}: expected a non-negative integer")]
    InvalidVar { var: &'static str, value: String },

    #[error("max_microsteps must be at least 1")]
    ZeroMicrosteps,
}

/// Limits applied by every machine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Microsteps allowed in one macrostep before it is aborted.
    #[serde(default = "default_max_microsteps")]
    pub max_microsteps: usize,

    /// Transitions kept in history; `None` keeps everything.
    #[serde(default = "default_history_limit")]
    pub history_limit: Option<usize>,
}

fn default_max_microsteps() -> usize {
    64
}

fn default_history_limit() -> Option<usize> {
    Some(128)
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_microsteps: default_max_microsteps(),
            history_limit: default_history_limit(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Defaults overridden by `APPFLOW_MAX_MICROSTEPS` and
    /// `APPFLOW_HISTORY_LIMIT`. A history limit of `0` disables the bound.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = lookup(MAX_MICROSTEPS_VAR) {
            config.max_microsteps = parse_var(MAX_MICROSTEPS_VAR, &value)?;
        }
        if let Some(value) = lookup(HISTORY_LIMIT_VAR) {
            config.history_limit = Some(parse_var(HISTORY_LIMIT_VAR, &value)?);
        }
        config.validate()
    }

    /// Rejects a zero microstep limit. A history limit of `0` means
    /// unbounded, whichever source it came from.
    fn validate(mut self) -> Result<Self, ConfigError> {
        if self.max_microsteps == 0 {
            return Err(ConfigError::ZeroMicrosteps);
        }
        if self.history_limit == Some(0) {
            self.history_limit = None;
        }
        Ok(self)
    }
}

fn parse_var(var: &'static str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidVar {
        var,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn defaults_bound_microsteps_and_history() {
        let config = EngineConfig::default();
        assert_eq!(config.max_microsteps, 64);
        assert_eq!(config.history_limit, Some(128));
    }

    #[test]
    fn json_fills_missing_fields_with_defaults() {
        let config = EngineConfig::from_json_str(r#"{ "history_limit": null }"#).unwrap();
        assert_eq!(config.max_microsteps, 64);
        assert_eq!(config.history_limit, None);
    }

    #[test]
    fn zero_microsteps_is_rejected() {
        let result = EngineConfig::from_json_str(r#"{ "max_microsteps": 0 }"#);
        assert!(matches!(result, Err(ConfigError::ZeroMicrosteps)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let result = EngineConfig::from_json_str("{ not json");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn env_overrides_defaults() {
        let config = EngineConfig::from_lookup(lookup(&[
            (MAX_MICROSTEPS_VAR, "8"),
            (HISTORY_LIMIT_VAR, "0"),
        ]))
        .unwrap();

        assert_eq!(config.max_microsteps, 8);
        assert_eq!(config.history_limit, None);
    }

    #[test]
    fn zero_history_limit_is_unbounded_from_any_source() {
        let from_json = EngineConfig::from_json_str(r#"{ "history_limit": 0 }"#).unwrap();
        let from_env = EngineConfig::from_lookup(lookup(&[(HISTORY_LIMIT_VAR, "0")])).unwrap();

        assert_eq!(from_json.history_limit, None);
        assert_eq!(from_json, from_env);
    }

    #[test]
    fn env_rejects_garbage() {
        let result = EngineConfig::from_lookup(lookup(&[(MAX_MICROSTEPS_VAR, "lots")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidVar { var: MAX_MICROSTEPS_VAR, .. })
        ));
    }

    #[test]
    fn missing_file_reports_path() {
        let result = EngineConfig::from_file("/definitely/not/here.json");
        match result {
            Err(ConfigError::Io { path, .. }) => {
                assert_eq!(path, PathBuf::from("/definitely/not/here.json"))
            }
            other => panic!("expected io error, got {:?}", other),
        }
    }
}
