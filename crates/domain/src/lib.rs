//! Domain layer for the API starter
//!
//! Contains the user entity, its value objects, and domain errors.
//! This layer knows nothing about HTTP or storage.

pub mod entities;
pub mod errors;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
