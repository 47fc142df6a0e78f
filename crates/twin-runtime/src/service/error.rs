//! Service lifecycle errors.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`ServiceError::Configuration`] | `SERVICE_CONFIGURATION` | No |
//! | [`ServiceError::Bus`] | `SERVICE_BUS` | source |
//! | [`ServiceError::Dispatch`] | `SERVICE_DISPATCH` | No |
//! | [`ServiceError::Asset`] | `SERVICE_ASSET` | source |
//! | [`ServiceError::AlreadyStarted`] | `SERVICE_ALREADY_STARTED` | No |
//! | [`ServiceError::NotStarted`] | `SERVICE_NOT_STARTED` | Yes |
//! | [`ServiceError::Stopped`] | `SERVICE_STOPPED` | No |

use crate::asset::AssetConnectionError;
use crate::bus::MessageBusError;
use crate::config::ConfigError;
use crate::dispatcher::DispatchError;
use thiserror::Error;
use twin_types::ErrorCode;

/// Failure building, starting or stopping a [`Service`](super::Service).
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("message bus error: {0}")]
    Bus(#[from] MessageBusError),

    #[error("dispatcher error: {0}")]
    Dispatch(#[from] DispatchError),

    #[error("asset connection error: {0}")]
    Asset(#[from] AssetConnectionError),

    #[error("service already started")]
    AlreadyStarted,

    #[error("service not started")]
    NotStarted,

    /// A stopped service cannot be restarted.
    #[error("service stopped")]
    Stopped,
}

impl ErrorCode for ServiceError {
    fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "SERVICE_CONFIGURATION",
            Self::Bus(_) => "SERVICE_BUS",
            Self::Dispatch(_) => "SERVICE_DISPATCH",
            Self::Asset(_) => "SERVICE_ASSET",
            Self::AlreadyStarted => "SERVICE_ALREADY_STARTED",
            Self::NotStarted => "SERVICE_NOT_STARTED",
            Self::Stopped => "SERVICE_STOPPED",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Bus(e) => e.is_recoverable(),
            Self::Asset(e) => e.is_recoverable(),
            Self::NotStarted => true,
            _ => false,
        }
    }
}
