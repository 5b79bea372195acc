//! Domain-level errors

use thiserror::Error;

/// Errors raised while building or looking up users
#[derive(Debug, Error)]
pub enum DomainError {
    /// Email address failed format validation
    #[error("Invalid email address: {0}")]
    InvalidEmailAddress(String),

    /// Entity not found
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    /// Any other field rule was violated
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

impl DomainError {
    /// Create a not found error
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_keeps_entity_and_id() {
        let err = DomainError::not_found("User", "123");
        match err {
            DomainError::NotFound { entity_type, id } => {
                assert_eq!(entity_type, "User");
                assert_eq!(id, "123");
            },
            _ => unreachable!("Expected NotFound error"),
        }
    }

    #[test]
    fn not_found_message() {
        let err = DomainError::not_found("User", "123");
        assert_eq!(err.to_string(), "User not found: 123");
    }

    #[test]
    fn invalid_email_message() {
        let err = DomainError::InvalidEmailAddress("bad-email".to_string());
        assert_eq!(err.to_string(), "Invalid email address: bad-email");
    }

    #[test]
    fn validation_error_message() {
        let err = DomainError::ValidationError("name must not be empty".to_string());
        assert_eq!(err.to_string(), "Validation failed: name must not be empty");
    }
}
