//! Email address value object with validation
//!
//! # Examples
//!
//! ```
//! use domain::EmailAddress;
//!
//! let email = EmailAddress::new("User@Example.COM").unwrap();
//! assert_eq!(email.as_str(), "User@Example.COM");
//!
//! assert!(EmailAddress::new("invalid").is_err());
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::errors::DomainError;

/// A validated email address, kept exactly as given
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Validate)]
#[serde(transparent)]
pub struct EmailAddress {
    #[validate(email)]
    value: String,
}

impl EmailAddress {
    /// Create a new email address, validating the format
    ///
    /// # Errors
    ///
    /// Returns an error if the email format is invalid.
    pub fn new(email: impl Into<String>) -> Result<Self, DomainError> {
        let value = email.into();

        let candidate = Self { value };
        candidate
            .validate()
            .map_err(|_| DomainError::InvalidEmailAddress(candidate.value.clone()))?;

        Ok(candidate)
    }

    /// Get the email address as a string slice
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl TryFrom<&str> for EmailAddress {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
