//! In-memory user repository

use std::collections::HashMap;

use application::{ApplicationError, UserRepository};
use async_trait::async_trait;
use domain::{User, UserId};
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Debug, Default)]
struct Users {
    by_id: HashMap<UserId, User>,
    order: Vec<UserId>,
}

/// Process-local user store
///
/// Contents live as long as the value; nothing is persisted.
#[derive(Debug, Default)]
pub struct InMemoryUserRepository {
    users: RwLock<Users>,
}

impl InMemoryUserRepository {
    /// Create an empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.users.read().await.order.len()
    }

    /// Check whether the repository is empty
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn insert(&self, user: &User) -> Result<(), ApplicationError> {
        let mut users = self.users.write().await;
        users.order.push(user.id);
        users.by_id.insert(user.id, user.clone());
        debug!(user_id = %user.id, total = users.order.len(), "Stored user");
        Ok(())
    }

    async fn get(&self, id: &UserId) -> Result<Option<User>, ApplicationError> {
        Ok(self.users.read().await.by_id.get(id).cloned())
    }

    async fn list(&self) -> Result<Vec<User>, ApplicationError> {
        let users = self.users.read().await;
        Ok(users
            .order
            .iter()
            .filter_map(|id| users.by_id.get(id).cloned())
            .collect())
    }
}
