//! Message bus errors.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`MessageBusError::NotStarted`] | `BUS_NOT_STARTED` | Yes |
//! | [`MessageBusError::Stopped`] | `BUS_STOPPED` | No |
//! | [`MessageBusError::Unavailable`] | `BUS_UNAVAILABLE` | Yes |
//! | [`MessageBusError::UnknownSubscription`] | `BUS_UNKNOWN_SUBSCRIPTION` | No |
//! | [`MessageBusError::SpawnFailed`] | `BUS_SPAWN_FAILED` | Yes |

use thiserror::Error;
use twin_types::{ErrorCode, SubscriptionId};

/// Message bus error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessageBusError {
    /// The bus has not been started yet.
    #[error("message bus not started")]
    NotStarted,

    /// The bus has been stopped and accepts no new subscriptions.
    #[error("message bus stopped")]
    Stopped,

    /// The transport cannot deliver events.
    #[error("message bus unavailable: {0}")]
    Unavailable(String),

    /// No subscription with this id exists.
    #[error("unknown subscription: {0}")]
    UnknownSubscription(SubscriptionId),

    /// The subscriber worker thread could not be created.
    #[error("failed to spawn subscriber worker: {0}")]
    SpawnFailed(String),
}

impl ErrorCode for MessageBusError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotStarted => "BUS_NOT_STARTED",
            Self::Stopped => "BUS_STOPPED",
            Self::Unavailable(_) => "BUS_UNAVAILABLE",
            Self::UnknownSubscription(_) => "BUS_UNKNOWN_SUBSCRIPTION",
            Self::SpawnFailed(_) => "BUS_SPAWN_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::NotStarted | Self::Unavailable(_) | Self::SpawnFailed(_)
        )
    }
}
