//! Configuration types.
//!
//! All types implement [`Default`] for compile-time fallback values.

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Environment variable overriding [`CoreConfig::request_handler_threads`].
pub const ENV_REQUEST_HANDLER_THREADS: &str = "TWIN_REQUEST_HANDLER_THREADS";

/// Environment variable overriding [`MessageBusConfig::subscriber_queue_capacity`].
pub const ENV_SUBSCRIBER_QUEUE_CAPACITY: &str = "TWIN_SUBSCRIBER_QUEUE_CAPACITY";

/// Service configuration.
///
/// # Example
///
/// ```
/// use twin_runtime::config::ServiceConfig;
///
/// let config = ServiceConfig::from_toml("[core]\nrequest_handler_threads = 8\n").unwrap();
/// assert_eq!(config.core.request_handler_threads, 8);
/// assert_eq!(config.message_bus.subscriber_queue_capacity, 1024);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Request processing settings.
    pub core: CoreConfig,

    /// Message bus settings.
    pub message_bus: MessageBusConfig,
}

/// Request processing configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoreConfig {
    /// Upper bound of concurrently processed asynchronous requests.
    pub request_handler_threads: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            request_handler_threads: 4,
        }
    }
}

/// Message bus configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MessageBusConfig {
    /// Events buffered per subscriber before new events are dropped.
    pub subscriber_queue_capacity: usize,
}

impl Default for MessageBusConfig {
    fn default() -> Self {
        Self {
            subscriber_queue_capacity: 1024,
        }
    }
}

impl ServiceConfig {
    /// Serializes to TOML string.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Deserializes from TOML string. Missing sections take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Loads a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ReadFile`] if the file is missing or
    /// unreadable, [`ConfigError::ParseFile`] if it is not valid TOML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config = toml::from_str(&content).map_err(|e| ConfigError::parse_file(path, e))?;
        debug!(path = %path.display(), "loaded service config");
        Ok(config)
    }

    /// Checks that every size is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for zero pool or queue sizes.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.core.request_handler_threads == 0 {
            return Err(ConfigError::Invalid {
                field: "core.request_handler_threads",
                message: "must be greater than 0".into(),
            });
        }
        if self.message_bus.subscriber_queue_capacity == 0 {
            return Err(ConfigError::Invalid {
                field: "message_bus.subscriber_queue_capacity",
                message: "must be greater than 0".into(),
            });
        }
        Ok(())
    }

    /// Applies `TWIN_*` environment variable overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidEnvVar`] if a variable is set but not
    /// a valid integer.
    pub fn apply_env(&mut self) -> Result<(), ConfigError> {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Applies overrides from an arbitrary variable source.
    ///
    /// # Errors
    ///
    /// Same as [`ServiceConfig::apply_env`].
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        if let Some(v) = lookup(ENV_REQUEST_HANDLER_THREADS) {
            self.core.request_handler_threads = parse_usize(ENV_REQUEST_HANDLER_THREADS, &v)?;
        }
        if let Some(v) = lookup(ENV_SUBSCRIBER_QUEUE_CAPACITY) {
            self.message_bus.subscriber_queue_capacity = parse_usize(ENV_SUBSCRIBER_QUEUE_CAPACITY, &v)?;
        }
        Ok(())
    }
}

fn parse_usize(name: &str, value: &str) -> Result<usize, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::invalid_env_var(name, "expected non-negative integer"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = ServiceConfig::default();
        assert_eq!(config.core.request_handler_threads, 4);
        assert_eq!(config.message_bus.subscriber_queue_capacity, 1024);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn toml_roundtrip() {
        let mut config = ServiceConfig::default();
        config.message_bus.subscriber_queue_capacity = 16;
        let text = config.to_toml().unwrap();
        assert!(text.contains("[message_bus]"));
        assert_eq!(ServiceConfig::from_toml(&text).unwrap(), config);
    }

    #[test]
    fn partial_toml_takes_defaults() {
        let config = ServiceConfig::from_toml("[message_bus]\nsubscriber_queue_capacity = 8\n").unwrap();
        assert_eq!(config.core.request_handler_threads, 4);
        assert_eq!(config.message_bus.subscriber_queue_capacity, 8);
    }

    #[test]
    fn malformed_toml_is_error() {
        assert!(matches!(
            ServiceConfig::from_toml("[core\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[core]\nrequest_handler_threads = 2").unwrap();
        let config = ServiceConfig::load(file.path()).unwrap();
        assert_eq!(config.core.request_handler_threads, 2);
    }

    #[test]
    fn load_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ServiceConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn load_invalid_file_reports_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "core = 5 = 6").unwrap();
        let err = ServiceConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseFile { .. }));
    }

    #[test]
    fn validate_rejects_zero_sizes() {
        let mut config = ServiceConfig::default();
        config.core.request_handler_threads = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "core.request_handler_threads",
                ..
            })
        ));

        let mut config = ServiceConfig::default();
        config.message_bus.subscriber_queue_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_REQUEST_HANDLER_THREADS, "12"),
            (ENV_SUBSCRIBER_QUEUE_CAPACITY, " 64 "),
        ]
        .into_iter()
        .collect();
        let mut config = ServiceConfig::default();
        config
            .apply_env_from(|name| vars.get(name).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.core.request_handler_threads, 12);
        assert_eq!(config.message_bus.subscriber_queue_capacity, 64);
    }

    #[test]
    fn env_override_invalid_value() {
        let mut config = ServiceConfig::default();
        let err = config
            .apply_env_from(|name| (name == ENV_REQUEST_HANDLER_THREADS).then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { .. }));
        assert_eq!(config.core.request_handler_threads, 4);
    }
}
