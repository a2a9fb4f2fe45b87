//! Curata Review Pipeline
//!
//! The pending-media intake and approval pipeline: a review session over
//! the repository's pending list, per-file drafts with synchronous field
//! validation, debounced slug negotiation against the server, selection and
//! bulk tagging, and coordinated batch submission with partial-failure
//! isolation.
//!
//! External collaborators (file store, slug resolver, tag directory,
//! notification sink) are reached through the traits in [`ports`].

pub mod batch;
mod negotiation;
pub mod ports;
pub mod session;

// Re-export commonly used types
pub use batch::BatchOutcome;
pub use ports::{Notifier, PendingFileRepository, SlugResolver, TagDirectory, TracingNotifier};
pub use session::{ApprovalOutcome, BulkApproveOutcome, ReviewSession};
