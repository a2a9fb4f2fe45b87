//! Port traits for the external collaborators of the review pipeline.
//!
//! The pipeline owns no storage and no transport; everything it needs from
//! the outside world comes through these traits. `curata-api-client`
//! implements them against the CMS REST API; tests substitute in-memory
//! fakes.

use async_trait::async_trait;
use uuid::Uuid;

use curata_core::models::{ApproveRequest, ListPendingQuery, Notification, PendingFile, Tag};
use curata_core::{AppError, CommitError};

/// The pending-file store: lists files awaiting review and commits
/// per-file approve/reject decisions.
#[async_trait]
pub trait PendingFileRepository: Send + Sync {
    async fn list(&self, query: &ListPendingQuery) -> Result<Vec<PendingFile>, AppError>;

    async fn get(&self, id: Uuid) -> Result<Option<PendingFile>, AppError>;

    /// Commit one approval. A rejected commit carries the server's
    /// field-level errors, already normalized.
    async fn approve(&self, request: &ApproveRequest) -> Result<(), CommitError>;

    async fn reject(&self, id: Uuid) -> Result<(), AppError>;
}

/// Server-side slug uniqueness check. Idempotent and side-effect-free: the
/// same inputs always produce the same slug, and nothing is reserved.
#[async_trait]
pub trait SlugResolver: Send + Sync {
    async fn resolve(
        &self,
        title: &str,
        namespace: &str,
        slugs_in_use: &[String],
    ) -> Result<String, AppError>;
}

/// Tag lookup within a namespace.
#[async_trait]
pub trait TagDirectory: Send + Sync {
    async fn search(&self, namespace: &str, query: &str) -> Result<Vec<Tag>, AppError>;
}

/// Fire-and-forget sink for user-facing messages. Implementations must not
/// block; the pipeline calls this from synchronous paths.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Default notifier that forwards messages to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        use curata_core::models::Severity;

        match notification.severity {
            Severity::Info | Severity::Success => {
                tracing::info!(message = %notification.message, "notification")
            }
            Severity::Warning => {
                tracing::warn!(message = %notification.message, "notification")
            }
            Severity::Error => {
                tracing::error!(message = %notification.message, "notification")
            }
        }
    }
}
