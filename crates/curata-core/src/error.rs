//! Error types module
//!
//! This module provides the core error types used throughout the Curata
//! review pipeline. All errors are unified under the `AppError` enum which
//! can represent repository, slug-resolution, validation, and configuration
//! failures.

use crate::validation::FieldErrors;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Repository error: {0}")]
    Repository(String),

    #[error("Slug resolution error: {0}")]
    SlugResolution(String),

    #[error("Tag directory error: {0}")]
    TagDirectory(String),

    #[error("Batch submission already in progress")]
    SubmissionInFlight,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure returned by the repository's approve operation.
///
/// Carries the server's field-level validation errors when the commit was
/// rejected for correctable metadata, already normalized into the same
/// per-field shape the local validator produces. Transport-level failures
/// have no field errors.
#[derive(Debug, thiserror::Error)]
#[error("Commit failed: {message}")]
pub struct CommitError {
    pub message: String,
    pub field_errors: Option<FieldErrors>,
}

impl CommitError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field_errors: None,
        }
    }

    pub fn rejected(message: impl Into<String>, field_errors: FieldErrors) -> Self {
        Self {
            message: message.into(),
            field_errors: Some(field_errors),
        }
    }
}
