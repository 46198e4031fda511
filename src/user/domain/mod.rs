//! Domain model for users.

mod error;
mod ids;
mod user;

pub use error::UserDomainError;
pub use ids::{EmailAddress, UserId};
pub use user::{PersistedUserData, User};
