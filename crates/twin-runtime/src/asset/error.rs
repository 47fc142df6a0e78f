//! Asset connection errors.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`AssetConnectionError::NotBound`] | `ASSET_NOT_BOUND` | No |
//! | [`AssetConnectionError::Unreachable`] | `ASSET_UNREACHABLE` | Yes |
//! | [`AssetConnectionError::Rejected`] | `ASSET_REJECTED` | No |
//! | [`AssetConnectionError::Failed`] | `ASSET_FAILED` | No |

use super::Capability;
use thiserror::Error;
use twin_types::{ErrorCode, Reference};

/// Failure talking to an external asset.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetConnectionError {
    /// No provider is bound for the reference and capability.
    #[error("no {capability} provider bound for {reference}")]
    NotBound {
        reference: Reference,
        capability: Capability,
    },

    /// The asset cannot be reached right now.
    #[error("asset unreachable: {0}")]
    Unreachable(String),

    /// The asset refused the request.
    #[error("asset rejected request: {0}")]
    Rejected(String),

    /// Any other provider failure.
    #[error("asset connection failed: {0}")]
    Failed(String),
}

impl ErrorCode for AssetConnectionError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotBound { .. } => "ASSET_NOT_BOUND",
            Self::Unreachable(_) => "ASSET_UNREACHABLE",
            Self::Rejected(_) => "ASSET_REJECTED",
            Self::Failed(_) => "ASSET_FAILED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use twin_types::{assert_error_codes, Identifier};

    #[test]
    fn all_error_codes_valid() {
        assert_error_codes(
            &[
                AssetConnectionError::NotBound {
                    reference: Reference::submodel(&Identifier::new("urn:sm")),
                    capability: Capability::Operation,
                },
                AssetConnectionError::Unreachable("timeout".into()),
                AssetConnectionError::Rejected("busy".into()),
                AssetConnectionError::Failed("boom".into()),
            ],
            "ASSET_",
        );
    }

    #[test]
    fn not_bound_names_capability() {
        let err = AssetConnectionError::NotBound {
            reference: Reference::submodel(&Identifier::new("urn:sm")),
            capability: Capability::Subscription,
        };
        assert!(err.to_string().contains("subscription"));
        assert!(!err.is_recoverable());
    }
}
