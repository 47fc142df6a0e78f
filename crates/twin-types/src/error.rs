//! Unified error interface for the twin runtime.
//!
//! Every error type in the workspace implements [`ErrorCode`] so that the
//! dispatcher, the service facade and log output can treat failures
//! uniformly, regardless of which layer produced them.
//!
//! # Example
//!
//! ```
//! use twin_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum StoreError {
//!     Missing(String),
//!     Busy,
//! }
//!
//! impl ErrorCode for StoreError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::Missing(_) => "STORE_MISSING",
//!             Self::Busy => "STORE_BUSY",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::Busy)
//!     }
//! }
//!
//! let err = StoreError::Busy;
//! assert_eq!(err.code(), "STORE_BUSY");
//! assert!(err.is_recoverable());
//! ```

/// Machine-readable error classification.
///
/// # Code Format
///
/// - **UPPER_SNAKE_CASE**, e.g. `"BUS_NOT_STARTED"`
/// - **Prefixed by layer**: `PERSISTENCE_`, `ASSET_`, `BUS_`, `HANDLER_`, ...
/// - **Stable**: codes are part of the log and API contract
///
/// # Recoverability
///
/// An error is recoverable when retrying the same call may succeed
/// (an asset connection that is temporarily unreachable, a full queue).
/// Bad input, missing resources and configuration errors are not.
pub trait ErrorCode {
    /// Returns the stable machine-readable code.
    fn code(&self) -> &'static str;

    /// Returns whether a retry may succeed.
    fn is_recoverable(&self) -> bool;
}

/// Asserts that an error code follows the workspace conventions.
///
/// # Panics
///
/// Panics if the code is empty, lacks `expected_prefix`, or is not
/// UPPER_SNAKE_CASE.
///
/// # Example
///
/// ```
/// use twin_types::{assert_error_code, ErrorCode};
///
/// struct Timeout;
///
/// impl ErrorCode for Timeout {
///     fn code(&self) -> &'static str { "ASSET_TIMEOUT" }
///     fn is_recoverable(&self) -> bool { true }
/// }
///
/// assert_error_code(&Timeout, "ASSET_");
/// ```
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "Error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "Error code '{}' must start with prefix '{}'",
        code,
        expected_prefix
    );
    assert!(
        is_upper_snake_case(code),
        "Error code '{}' must be UPPER_SNAKE_CASE",
        code
    );
}

/// Asserts [`assert_error_code`] for every error in `errors`.
///
/// Error modules call this with one instance of each variant.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    if s.is_empty() || s.starts_with('_') || s.ends_with('_') || s.contains("__") {
        return false;
    }

    s.chars()
        .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    enum ProbeError {
        Transient,
        Permanent,
    }

    impl ErrorCode for ProbeError {
        fn code(&self) -> &'static str {
            match self {
                Self::Transient => "PROBE_TRANSIENT",
                Self::Permanent => "PROBE_PERMANENT",
            }
        }

        fn is_recoverable(&self) -> bool {
            matches!(self, Self::Transient)
        }
    }

    #[test]
    fn codes_and_recoverability() {
        assert_eq!(ProbeError::Transient.code(), "PROBE_TRANSIENT");
        assert!(ProbeError::Transient.is_recoverable());
        assert!(!ProbeError::Permanent.is_recoverable());
    }

    #[test]
    fn all_variants_pass_convention() {
        assert_error_codes(&[ProbeError::Transient, ProbeError::Permanent], "PROBE_");
    }

    #[test]
    #[should_panic(expected = "must start with prefix")]
    fn wrong_prefix_panics() {
        assert_error_code(&ProbeError::Transient, "BUS_");
    }

    #[test]
    fn snake_case_rules() {
        assert!(is_upper_snake_case("BUS_NOT_STARTED"));
        assert!(is_upper_snake_case("ASSET_IO_2"));
        assert!(!is_upper_snake_case(""));
        assert!(!is_upper_snake_case("bus_failed"));
        assert!(!is_upper_snake_case("_BUS"));
        assert!(!is_upper_snake_case("BUS_"));
        assert!(!is_upper_snake_case("BUS__FAILED"));
    }
}
