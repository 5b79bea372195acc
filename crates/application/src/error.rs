//! Application-level errors

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Storage or other infrastructure failure
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_error_is_transparent() {
        let err: ApplicationError = DomainError::not_found("User", "42").into();
        assert_eq!(err.to_string(), "User not found: 42");
    }

    #[test]
    fn internal_message() {
        let err = ApplicationError::Internal("store unavailable".to_string());
        assert_eq!(err.to_string(), "Internal error: store unavailable");
    }
}
