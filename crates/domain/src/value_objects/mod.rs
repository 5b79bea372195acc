//! Value Objects - Immutable, identity-less domain primitives

mod email_address;
mod user_id;

pub use email_address::EmailAddress;
pub use user_id::UserId;
