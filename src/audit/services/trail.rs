//! Fire-and-forget audit emission.

use crate::audit::{domain::AuditRecord, ports::AuditSink};
use std::sync::Arc;
use tracing::warn;

/// Emits audit records without letting sink failures escape.
#[derive(Debug)]
pub struct AuditTrail<S>
where
    S: AuditSink + ?Sized,
{
    sink: Arc<S>,
}

impl<S> Clone for AuditTrail<S>
where
    S: AuditSink + ?Sized,
{
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
        }
    }
}

impl<S> AuditTrail<S>
where
    S: AuditSink + ?Sized,
{
    /// Creates a trail writing to `sink`.
    #[must_use]
    pub const fn new(sink: Arc<S>) -> Self {
        Self { sink }
    }

    /// Records `record`, logging and discarding any sink failure.
    pub async fn emit(&self, record: AuditRecord) {
        let action = record.action();
        let resource_id = record.resource_id();
        if let Err(err) = self.sink.record(record).await {
            warn!(
                %action,
                ?resource_id,
                error = %err,
                "audit record dropped"
            );
        }
    }
}
