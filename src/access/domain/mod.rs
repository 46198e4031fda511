//! Caller identity and role types.

mod caller;
mod error;
mod role;

pub use caller::Caller;
pub use error::ParseRoleError;
pub use role::Role;
