//! User directory.
//!
//! Users belong to exactly one organization and hold one [`Role`] there.
//! The directory stores them and turns a stored user into the
//! [`Caller`] identity that task operations are authorized against.
//!
//! [`Role`]: crate::access::domain::Role
//! [`Caller`]: crate::access::domain::Caller

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
