//! Application layer - Use cases and orchestration
//!
//! Contains the user use cases and the port they need from storage.

pub mod error;
pub mod ports;
pub mod services;

pub use error::ApplicationError;
pub use ports::*;
pub use services::*;
