//! User use cases
//!
//! Create, fetch, and list users on top of a [`UserRepository`].

use std::sync::Arc;

use domain::{DomainError, NewUser, User, UserId};
use serde::Serialize;
use tracing::{debug, instrument};

use crate::{error::ApplicationError, ports::UserRepository};

/// Listing parameters, already parsed from the query string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListUsers {
    /// 1-based page number
    pub page: u32,
    /// Page size
    pub limit: u32,
    /// Free-text filter
    pub query: Option<String>,
}

impl Default for ListUsers {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 10,
            query: None,
        }
    }
}

/// One page of results plus the size of the filtered collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: u32,
    pub limit: u32,
}

/// User management service
#[derive(Clone)]
pub struct UserService {
    repository: Arc<dyn UserRepository>,
}

impl std::fmt::Debug for UserService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserService").finish_non_exhaustive()
    }
}

impl UserService {
    /// Create a new user service backed by the given repository
    pub fn new(repository: Arc<dyn UserRepository>) -> Self {
        Self { repository }
    }

    /// Register a new user
    #[instrument(skip(self, name))]
    pub async fn create(&self, email: &str, name: &str) -> Result<User, ApplicationError> {
        let user = User::register(NewUser::new(email, name)?);
        self.repository.insert(&user).await?;
        debug!(user_id = %user.id, "User created");
        Ok(user)
    }

    /// Fetch a user by id
    #[instrument(skip(self))]
    pub async fn get(&self, id: UserId) -> Result<User, ApplicationError> {
        self.repository
            .get(&id)
            .await?
            .ok_or_else(|| DomainError::not_found("User", id.to_string()).into())
    }

    /// List users, filtered by `query` and sliced into one page
    pub async fn list(&self, params: &ListUsers) -> Result<Page<User>, ApplicationError> {
        let mut users = self.repository.list().await?;

        if let Some(query) = params.query.as_deref().filter(|q| !q.is_empty()) {
            let needle = query.to_lowercase();
            users.retain(|user| user.matches(&needle));
        }

        let page = params.page.max(1);
        let limit = params.limit.max(1);
        let total = users.len();
        let start = (page as usize - 1).saturating_mul(limit as usize);

        let items = users
            .into_iter()
            .skip(start)
            .take(limit as usize)
            .collect();

        Ok(Page {
            items,
            total,
            page,
            limit,
        })
    }
}
