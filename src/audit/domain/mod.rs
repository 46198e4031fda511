//! Audit record types.

mod record;

pub use record::{AuditAction, AuditRecord, ParseAuditActionError, PersistedAuditRecordData};
