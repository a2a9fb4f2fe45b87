//! Domain models for the review pipeline.

pub mod approve;
pub mod decision;
pub mod draft;
pub mod notification;
pub mod pending_file;
pub mod tag;

pub use approve::ApproveRequest;
pub use decision::{Decision, SlugNegotiation};
pub use draft::{AccessLevel, CollectionTarget, ReviewDraft};
pub use notification::{Notification, Severity};
pub use pending_file::{
    FileKind, ListPendingQuery, PendingFile, PendingSortField, PendingStatusFilter, SortDirection,
};
pub use tag::{merge_tags, Tag, TagId, TagRef, TagSelector};
