//! Infrastructure layer - Adapters for external systems
//!
//! Implements ports defined in the application layer and owns
//! configuration loading and logging setup.

pub mod config;
pub mod persistence;
pub mod telemetry;

pub use config::{AppConfig, CorsOrigins, Environment, LogFormat};
pub use persistence::InMemoryUserRepository;
pub use telemetry::{TelemetryError, init_tracing};
