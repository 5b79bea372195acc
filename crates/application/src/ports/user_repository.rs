//! User storage port

use async_trait::async_trait;
use domain::{User, UserId};

use crate::error::ApplicationError;

/// Port for user persistence
///
/// Implementations must keep insertion order for `list`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Store a new user
    async fn insert(&self, user: &User) -> Result<(), ApplicationError>;

    /// Get a user by ID
    async fn get(&self, id: &UserId) -> Result<Option<User>, ApplicationError>;

    /// All users in insertion order
    async fn list(&self) -> Result<Vec<User>, ApplicationError>;
}
