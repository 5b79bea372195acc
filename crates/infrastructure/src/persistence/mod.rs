//! Storage adapters
//!
//! Only an in-memory store is provided; swap in a database-backed
//! [`application::UserRepository`] for anything beyond a demo.

mod in_memory_user_repository;

pub use in_memory_user_repository::InMemoryUserRepository;
