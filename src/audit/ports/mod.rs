//! Port contracts for audit recording.

pub mod sink;

pub use sink::{AuditLogReader, AuditSink, AuditSinkError, AuditSinkResult};

#[cfg(test)]
pub use sink::MockAuditSink;
