//! Batch submission coordinator.
//!
//! Drains every decided file to the repository: approvals first, then
//! rejections, both sequentially in stable list order so failures are
//! attributable and partial-state preservation is reproducible. A single
//! item's failure never blocks the rest of the batch.

use uuid::Uuid;

use curata_core::models::{ApproveRequest, Notification};
use curata_core::AppError;

use crate::session::ReviewSession;

/// Aggregate result of one batch submission.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    pub approved: usize,
    pub rejected: usize,
    /// Files whose approve call failed; their drafts, decisions, and
    /// server-reported field errors are preserved for correction and
    /// resubmission.
    pub failed: Vec<Uuid>,
}

impl BatchOutcome {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

impl ReviewSession {
    /// Commit every approve/reject decision to the repository.
    ///
    /// No-ops with an informational notification when nothing is decided.
    /// Refuses a second invocation while one is in flight. On a clean run
    /// the whole session state is cleared and the pending list is
    /// refreshed; if any approval failed, all state is preserved so the
    /// operator can correct and resubmit without re-entering data.
    #[tracing::instrument(skip(self))]
    pub async fn submit_batch(&self) -> Result<BatchOutcome, AppError> {
        let (approvals, rejections) = {
            let mut state = self.inner.state();
            if state.submitting {
                return Err(AppError::SubmissionInFlight);
            }

            let mut approvals: Vec<(Uuid, ApproveRequest, String)> = Vec::new();
            let mut rejections: Vec<(Uuid, String)> = Vec::new();
            for id in &state.order {
                let decision = state.decision(*id);
                if decision.is_approve() {
                    if let Some(draft) = state.drafts.get(id) {
                        approvals.push((
                            *id,
                            ApproveRequest::from_draft(*id, draft),
                            state.display_name(*id),
                        ));
                    }
                } else if decision.is_reject() {
                    rejections.push((*id, state.display_name(*id)));
                }
            }

            if approvals.is_empty() && rejections.is_empty() {
                drop(state);
                self.inner.notify(Notification::info(
                    "No files are marked for approval or rejection",
                ));
                return Ok(BatchOutcome::default());
            }

            state.submitting = true;
            (approvals, rejections)
        };

        let outcome = self.run_batch(approvals, rejections).await;
        self.inner.state().submitting = false;
        Ok(outcome)
    }

    async fn run_batch(
        &self,
        approvals: Vec<(Uuid, ApproveRequest, String)>,
        rejections: Vec<(Uuid, String)>,
    ) -> BatchOutcome {
        let mut outcome = BatchOutcome::default();

        // Approval pass: sequential, stable order.
        for (id, request, filename) in &approvals {
            match self.inner.files.approve(request).await {
                Ok(()) => {
                    outcome.approved += 1;
                    tracing::debug!(file_id = %id, slug = %request.slug, "approved");
                }
                Err(err) => {
                    tracing::warn!(file_id = %id, error = %err, "approve failed");
                    if let Some(fields) = err.field_errors.clone() {
                        self.inner.state().merge_errors(*id, fields);
                    }
                    self.inner.notify(Notification::error(format!(
                        "Failed to approve '{}': {}",
                        filename, err.message
                    )));
                    outcome.failed.push(*id);
                }
            }
        }

        // Rejection pass: failures are reported but never block the batch.
        for (id, filename) in &rejections {
            match self.inner.files.reject(*id).await {
                Ok(()) => outcome.rejected += 1,
                Err(e) => {
                    tracing::warn!(file_id = %id, error = %e, "reject failed");
                    self.inner.notify(Notification::warning(format!(
                        "Failed to reject '{}': {}",
                        filename, e
                    )));
                }
            }
        }

        // Reconciliation.
        if outcome.is_clean() {
            self.inner.timers.cancel_all();
            let query = {
                let mut state = self.inner.state();
                state.clear_all();
                state.last_query.clone()
            };
            match self.inner.files.list(&query).await {
                Ok(files) => {
                    self.inner.state().seed(query, files);
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to refresh pending list after batch");
                    self.inner.notify(Notification::warning(format!(
                        "Batch committed but the pending list could not be refreshed: {}",
                        e
                    )));
                }
            }
            self.inner.notify(Notification::success(format!(
                "Approved {} and rejected {} file(s)",
                outcome.approved, outcome.rejected
            )));
        } else {
            self.inner.notify(Notification::warning(format!(
                "{} approved, {} rejected, {} failed; failed files keep their drafts for correction",
                outcome.approved,
                outcome.rejected,
                outcome.failed.len()
            )));
        }

        outcome
    }
}
