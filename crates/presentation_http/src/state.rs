//! Application state shared across handlers

use std::sync::Arc;

use application::UserService;
use infrastructure::{AppConfig, InMemoryUserRepository};

/// Shared application state
#[derive(Clone, Debug)]
pub struct AppState {
    /// User use cases
    pub users: UserService,
    /// Application configuration
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// State backed by the in-memory user store
    pub fn in_memory(config: AppConfig) -> Self {
        Self {
            users: UserService::new(Arc::new(InMemoryUserRepository::new())),
            config: Arc::new(config),
        }
    }
}
