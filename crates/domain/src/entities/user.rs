//! User entity
//!
//! The demo resource served by the users API.

use serde::{Deserialize, Serialize};

use crate::{
    errors::DomainError,
    value_objects::{EmailAddress, UserId},
};

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: EmailAddress,
    pub name: String,
}

impl User {
    /// Materialize a new user with a freshly generated id
    pub fn register(input: NewUser) -> Self {
        Self {
            id: UserId::new(),
            email: input.email,
            name: input.name,
        }
    }

    /// Case-insensitive substring match against every field value
    ///
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        [
            self.id.to_string(),
            self.email.as_str().to_lowercase(),
            self.name.to_lowercase(),
        ]
        .iter()
        .any(|value| value.contains(needle))
    }
}

/// Validated input for creating a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    email: EmailAddress,
    name: String,
}

impl NewUser {
    /// Build the creation input, validating both fields
    pub fn new(email: &str, name: impl Into<String>) -> Result<Self, DomainError> {
        let email = EmailAddress::new(email)?;
        let name = name.into();
        if name.is_empty() {
            return Err(DomainError::ValidationError(
                "name must not be empty".to_string(),
            ));
        }
        Ok(Self { email, name })
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}
