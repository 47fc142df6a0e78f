//! Persistence errors.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`PersistenceError::NotFound`] | `PERSISTENCE_NOT_FOUND` | No |
//! | [`PersistenceError::AlreadyExists`] | `PERSISTENCE_ALREADY_EXISTS` | No |
//! | [`PersistenceError::InvalidParent`] | `PERSISTENCE_INVALID_PARENT` | No |
//! | [`PersistenceError::InvalidReference`] | `PERSISTENCE_INVALID_REFERENCE` | No |
//! | [`PersistenceError::InvalidValue`] | `PERSISTENCE_INVALID_VALUE` | No |
//! | [`PersistenceError::OperationNotFound`] | `PERSISTENCE_OPERATION_NOT_FOUND` | No |
//! | [`PersistenceError::Unavailable`] | `PERSISTENCE_UNAVAILABLE` | Yes |

use thiserror::Error;
use twin_model::ValueParseError;
use twin_types::{ErrorCode, HandleId, Reference};

/// Persistence layer error.
#[derive(Debug, Clone, Error)]
pub enum PersistenceError {
    /// No shell, submodel or element exists at the given location.
    #[error("resource not found: {0}")]
    NotFound(String),

    /// An identifiable or id_short is already taken.
    #[error("resource already exists: {0}")]
    AlreadyExists(String),

    /// The parent of a new element cannot hold children.
    #[error("{0} cannot contain submodel elements")]
    InvalidParent(Reference),

    /// The reference does not address the kind of resource requested.
    #[error("invalid reference: {0}")]
    InvalidReference(Reference),

    /// A value does not fit the stored element.
    #[error(transparent)]
    InvalidValue(#[from] ValueParseError),

    /// No operation result exists for the handle.
    #[error("no operation result for {0}")]
    OperationNotFound(HandleId),

    /// The backing store cannot be reached.
    #[error("persistence unavailable: {0}")]
    Unavailable(String),
}

impl PersistenceError {
    /// Returns `true` for missing shells, submodels, elements or
    /// operation results.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::OperationNotFound(_))
    }
}

impl ErrorCode for PersistenceError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "PERSISTENCE_NOT_FOUND",
            Self::AlreadyExists(_) => "PERSISTENCE_ALREADY_EXISTS",
            Self::InvalidParent(_) => "PERSISTENCE_INVALID_PARENT",
            Self::InvalidReference(_) => "PERSISTENCE_INVALID_REFERENCE",
            Self::InvalidValue(_) => "PERSISTENCE_INVALID_VALUE",
            Self::OperationNotFound(_) => "PERSISTENCE_OPERATION_NOT_FOUND",
            Self::Unavailable(_) => "PERSISTENCE_UNAVAILABLE",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twin_types::{assert_error_codes, Identifier};

    fn all_variants() -> Vec<PersistenceError> {
        let r = Reference::submodel(&Identifier::new("urn:sm"));
        vec![
            PersistenceError::NotFound("x".into()),
            PersistenceError::AlreadyExists("x".into()),
            PersistenceError::InvalidParent(r.clone()),
            PersistenceError::InvalidReference(r),
            PersistenceError::InvalidValue(ValueParseError::InvalidJson("x".into())),
            PersistenceError::OperationNotFound(HandleId::new()),
            PersistenceError::Unavailable("down".into()),
        ]
    }

    #[test]
    fn all_error_codes_valid() {
        assert_error_codes(&all_variants(), "PERSISTENCE_");
    }

    #[test]
    fn only_unavailable_is_recoverable() {
        for err in all_variants() {
            assert_eq!(
                err.is_recoverable(),
                matches!(err, PersistenceError::Unavailable(_)),
                "{}",
                err.code()
            );
        }
    }
}
