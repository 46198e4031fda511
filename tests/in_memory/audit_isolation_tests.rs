//! Audit sink failures never fail the mutation that produced them.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::helpers::app_with_sink;
use async_trait::async_trait;
use rstest::rstest;
use taskboard::{
    access::domain::Role,
    audit::{
        domain::AuditRecord,
        ports::{AuditSink, AuditSinkError, AuditSinkResult},
    },
    task::{
        domain::{TaskEdit, TaskStatus},
        services::CreateTaskRequest,
    },
};

/// Sink that rejects every record and counts the attempts.
#[derive(Default)]
struct OfflineSink {
    attempts: AtomicUsize,
}

#[async_trait]
impl AuditSink for OfflineSink {
    async fn record(&self, _record: AuditRecord) -> AuditSinkResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(AuditSinkError::persistence(std::io::Error::other(
            "audit store offline",
        )))
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn mutations_succeed_while_audit_is_offline() -> Result<(), eyre::Report> {
    let sink = Arc::new(OfflineSink::default());
    let app = app_with_sink(Arc::clone(&sink));
    let acme = app.organization("Acme", None).await?;
    let admin = app.member("ops@acme.test", Role::Admin, acme).await?;

    let task = app
        .board
        .create_task(&admin, CreateTaskRequest::new("Rotate keys"))
        .await?;
    app.board
        .update_task(&admin, task.id(), TaskEdit::new().with_category("security"))
        .await?;
    app.board.delete_task(&admin, task.id()).await?;

    let remaining = app.board.list_column(&admin, acme, TaskStatus::Todo).await?;
    eyre::ensure!(remaining.is_empty(), "task should be gone");
    eyre::ensure!(
        sink.attempts.load(Ordering::SeqCst) == 3,
        "every mutation should have tried to audit"
    );
    Ok(())
}
