//! Audit emission helpers.

mod trail;

pub use trail::AuditTrail;
