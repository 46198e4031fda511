//! Structured audit log of task mutations.
//!
//! Task mutations emit [`domain::AuditRecord`]s into an
//! [`ports::AuditSink`]. Sinks are fire-and-forget from the caller's
//! perspective: [`services::AuditTrail`] logs and discards sink failures so
//! an unavailable audit store never fails the mutation it describes.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
