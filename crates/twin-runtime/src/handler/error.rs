//! Handler errors.
//!
//! # Error Codes
//!
//! | Variant | Code | Status |
//! |---------|------|--------|
//! | [`HandlerError::ResourceNotFound`] | `HANDLER_RESOURCE_NOT_FOUND` | `ClientErrorResourceNotFound` |
//! | [`HandlerError::BadRequest`] | `HANDLER_BAD_REQUEST` | `ClientErrorBadRequest` |
//! | [`HandlerError::Conflict`] | `HANDLER_CONFLICT` | `ClientErrorBadRequest` |
//! | [`HandlerError::NoOperationProvider`] | `HANDLER_NO_OPERATION_PROVIDER` | `ServerInternalError` |
//! | [`HandlerError::UnexpectedRequest`] | `HANDLER_UNEXPECTED_REQUEST` | `ServerInternalError` |
//! | [`HandlerError::Persistence`] | `HANDLER_PERSISTENCE` | depends on source |
//! | [`HandlerError::Asset`] | `HANDLER_ASSET` | `ServerInternalError` |
//! | [`HandlerError::Bus`] | `HANDLER_BUS` | `ServerInternalError` |
//! | [`HandlerError::Value`] | `HANDLER_VALUE` | `ClientErrorBadRequest` |
//! | [`HandlerError::Operation`] | `HANDLER_OPERATION` | `ServerInternalError` |

use crate::asset::AssetConnectionError;
use crate::bus::MessageBusError;
use crate::operation::OperationError;
use crate::persistence::PersistenceError;
use crate::request::RequestKind;
use thiserror::Error;
use twin_model::ValueParseError;
use twin_types::{ErrorCode, Reference, StatusCode};

/// Failure while processing one request.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("resource not found: {0}")]
    ResourceNotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    /// The resource to create already exists.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("no operation provider bound for {0}")]
    NoOperationProvider(Reference),

    /// A handler received a request of another kind.
    #[error("{0} handler received a foreign request")]
    UnexpectedRequest(RequestKind),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error(transparent)]
    Asset(#[from] AssetConnectionError),

    #[error(transparent)]
    Bus(#[from] MessageBusError),

    #[error(transparent)]
    Value(#[from] ValueParseError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

impl HandlerError {
    /// Maps a failed create, turning an existing resource into
    /// [`HandlerError::Conflict`].
    pub(crate) fn from_create(err: PersistenceError) -> Self {
        match err {
            PersistenceError::AlreadyExists(what) => Self::Conflict(what),
            other => other.into(),
        }
    }

    /// Status reported to the caller.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::ResourceNotFound(_) => StatusCode::ClientErrorResourceNotFound,
            Self::BadRequest(_) | Self::Conflict(_) | Self::Value(_) => StatusCode::ClientErrorBadRequest,
            Self::Persistence(e) if e.is_not_found() => StatusCode::ClientErrorResourceNotFound,
            Self::Persistence(
                PersistenceError::AlreadyExists(_)
                | PersistenceError::InvalidParent(_)
                | PersistenceError::InvalidReference(_)
                | PersistenceError::InvalidValue(_),
            ) => StatusCode::ClientErrorBadRequest,
            Self::Persistence(_)
            | Self::NoOperationProvider(_)
            | Self::UnexpectedRequest(_)
            | Self::Asset(_)
            | Self::Bus(_)
            | Self::Operation(_) => StatusCode::ServerInternalError,
        }
    }
}

impl ErrorCode for HandlerError {
    fn code(&self) -> &'static str {
        match self {
            Self::ResourceNotFound(_) => "HANDLER_RESOURCE_NOT_FOUND",
            Self::BadRequest(_) => "HANDLER_BAD_REQUEST",
            Self::Conflict(_) => "HANDLER_CONFLICT",
            Self::NoOperationProvider(_) => "HANDLER_NO_OPERATION_PROVIDER",
            Self::UnexpectedRequest(_) => "HANDLER_UNEXPECTED_REQUEST",
            Self::Persistence(_) => "HANDLER_PERSISTENCE",
            Self::Asset(_) => "HANDLER_ASSET",
            Self::Bus(_) => "HANDLER_BUS",
            Self::Value(_) => "HANDLER_VALUE",
            Self::Operation(_) => "HANDLER_OPERATION",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Persistence(e) => e.is_recoverable(),
            Self::Asset(e) => e.is_recoverable(),
            Self::Bus(e) => e.is_recoverable(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::ExecutionState;
    use twin_types::{assert_error_codes, HandleId, Identifier};

    fn element() -> Reference {
        Reference::submodel(&Identifier::new("urn:sm")).child("Speed")
    }

    fn all_variants() -> Vec<HandlerError> {
        vec![
            HandlerError::ResourceNotFound("x".into()),
            HandlerError::BadRequest("x".into()),
            HandlerError::Conflict("x".into()),
            HandlerError::NoOperationProvider(element()),
            HandlerError::UnexpectedRequest(RequestKind::GetAllSubmodels),
            HandlerError::Persistence(PersistenceError::Unavailable("down".into())),
            HandlerError::Asset(AssetConnectionError::Unreachable("plc".into())),
            HandlerError::Bus(MessageBusError::Unavailable("broker".into())),
            HandlerError::Value(ValueParseError::InvalidJson("eof".into())),
            HandlerError::Operation(OperationError::AlreadyTerminal(ExecutionState::Completed)),
        ]
    }

    #[test]
    fn all_error_codes_valid() {
        assert_error_codes(&all_variants(), "HANDLER_");
    }

    #[test]
    fn not_found_maps_to_404() {
        assert_eq!(
            HandlerError::Persistence(PersistenceError::NotFound("sm".into())).status(),
            StatusCode::ClientErrorResourceNotFound
        );
        assert_eq!(
            HandlerError::Persistence(PersistenceError::OperationNotFound(HandleId::new())).status(),
            StatusCode::ClientErrorResourceNotFound
        );
    }

    #[test]
    fn client_mistakes_map_to_400() {
        assert_eq!(
            HandlerError::Persistence(PersistenceError::AlreadyExists("sm".into())).status(),
            StatusCode::ClientErrorBadRequest
        );
        assert_eq!(
            HandlerError::Value(ValueParseError::InvalidJson("eof".into())).status(),
            StatusCode::ClientErrorBadRequest
        );
    }

    #[test]
    fn infrastructure_failures_map_to_500() {
        assert_eq!(
            HandlerError::Asset(AssetConnectionError::Failed("x".into())).status(),
            StatusCode::ServerInternalError
        );
        assert_eq!(
            HandlerError::NoOperationProvider(element()).status(),
            StatusCode::ServerInternalError
        );
        assert!(HandlerError::Asset(AssetConnectionError::Unreachable("x".into())).is_recoverable());
    }
}
