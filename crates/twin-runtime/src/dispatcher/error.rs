//! Dispatcher errors.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`DispatchError::InvalidArgument`] | `DISPATCH_INVALID_ARGUMENT` | No |
//! | [`DispatchError::NoHandler`] | `DISPATCH_NO_HANDLER` | No |
//! | [`DispatchError::DuplicateHandler`] | `DISPATCH_DUPLICATE_HANDLER` | No |
//! | [`DispatchError::HandlerPanicked`] | `DISPATCH_HANDLER_PANICKED` | No |
//! | [`DispatchError::PoolUnavailable`] | `DISPATCH_POOL_UNAVAILABLE` | No |

use crate::request::RequestKind;
use thiserror::Error;
use twin_types::{ErrorCode, StatusCode};

/// Failure routing a request to its handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// The request failed a structural precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("no handler registered for {0}")]
    NoHandler(RequestKind),

    #[error("more than one handler registered for {0}")]
    DuplicateHandler(RequestKind),

    #[error("{kind} handler panicked: {message}")]
    HandlerPanicked { kind: RequestKind, message: String },

    /// The worker pool is shut down or could not be built.
    #[error("request worker pool unavailable: {0}")]
    PoolUnavailable(String),
}

impl DispatchError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidArgument(_) => StatusCode::ClientErrorBadRequest,
            _ => StatusCode::ServerInternalError,
        }
    }
}

impl ErrorCode for DispatchError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidArgument(_) => "DISPATCH_INVALID_ARGUMENT",
            Self::NoHandler(_) => "DISPATCH_NO_HANDLER",
            Self::DuplicateHandler(_) => "DISPATCH_DUPLICATE_HANDLER",
            Self::HandlerPanicked { .. } => "DISPATCH_HANDLER_PANICKED",
            Self::PoolUnavailable(_) => "DISPATCH_POOL_UNAVAILABLE",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}
