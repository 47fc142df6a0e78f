//! Configuration errors.
//!
//! Configuration errors are startup-only and fatal: the service refuses
//! to build rather than run with a broken setup.

use crate::asset::Capability;
use std::path::PathBuf;
use thiserror::Error;
use twin_types::{ErrorCode, Reference};

/// Configuration error type.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file.
    #[error("failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a config file.
    #[error("failed to parse config file '{path}': {source}")]
    ParseFile {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Failed to parse a TOML string.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Failed to serialize config.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// Invalid environment variable value.
    #[error("invalid value for environment variable '{name}': {message}")]
    InvalidEnvVar { name: String, message: String },

    /// A field holds an unusable value.
    #[error("invalid config value for '{field}': {message}")]
    Invalid { field: &'static str, message: String },

    /// Two asset connections bind the same reference and capability.
    #[error("duplicate {capability} binding for {reference} (connections '{first}' and '{second}')")]
    DuplicateBinding {
        reference: Reference,
        capability: Capability,
        first: String,
        second: String,
    },

    /// The service was built without an initial environment.
    #[error("no environment configured")]
    MissingEnvironment,
}

impl ConfigError {
    /// Creates a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Creates a parse file error.
    pub fn parse_file(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Self::ParseFile {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid env var error.
    pub fn invalid_env_var(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidEnvVar {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::ReadFile { .. } => "CONFIG_READ_FILE",
            Self::ParseFile { .. } => "CONFIG_PARSE_FILE",
            Self::Parse(_) => "CONFIG_PARSE",
            Self::Serialize(_) => "CONFIG_SERIALIZE",
            Self::InvalidEnvVar { .. } => "CONFIG_INVALID_ENV_VAR",
            Self::Invalid { .. } => "CONFIG_INVALID",
            Self::DuplicateBinding { .. } => "CONFIG_DUPLICATE_BINDING",
            Self::MissingEnvironment => "CONFIG_MISSING_ENVIRONMENT",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}
