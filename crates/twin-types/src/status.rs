//! Response status codes.
//!
//! Classification into success, client error and server error is a
//! property of each [`StatusCode`] value, so callers branch on
//! [`StatusCode::class`] instead of matching individual codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Coarse classification of a [`StatusCode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusClass {
    Success,
    ClientError,
    ServerError,
}

/// Outcome of a processed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusCode {
    Success,
    SuccessCreated,
    SuccessNoContent,
    ClientForbidden,
    ClientErrorBadRequest,
    ClientMethodNotAllowed,
    ClientErrorResourceNotFound,
    ServerInternalError,
    ServerErrorBadGateway,
}

impl StatusCode {
    /// Returns the classification of this code.
    #[must_use]
    pub const fn class(self) -> StatusClass {
        match self {
            Self::Success | Self::SuccessCreated | Self::SuccessNoContent => StatusClass::Success,
            Self::ClientForbidden
            | Self::ClientErrorBadRequest
            | Self::ClientMethodNotAllowed
            | Self::ClientErrorResourceNotFound => StatusClass::ClientError,
            Self::ServerInternalError | Self::ServerErrorBadGateway => StatusClass::ServerError,
        }
    }

    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self.class(), StatusClass::Success)
    }

    #[must_use]
    pub const fn is_client_error(self) -> bool {
        matches!(self.class(), StatusClass::ClientError)
    }

    #[must_use]
    pub const fn is_server_error(self) -> bool {
        matches!(self.class(), StatusClass::ServerError)
    }

    /// Closest HTTP status, for endpoints that expose responses over HTTP.
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::Success => 200,
            Self::SuccessCreated => 201,
            Self::SuccessNoContent => 204,
            Self::ClientErrorBadRequest => 400,
            Self::ClientForbidden => 403,
            Self::ClientErrorResourceNotFound => 404,
            Self::ClientMethodNotAllowed => 405,
            Self::ServerInternalError => 500,
            Self::ServerErrorBadGateway => 502,
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}
