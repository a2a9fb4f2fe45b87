//! Draft field validation.
//!
//! Pure, synchronous rule evaluation for the review-draft fields. Rules
//! produce at most one message per field; the review session owns the
//! per-file error map and keeps it sparse (a file's entry is dropped once
//! every field is valid again).

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::models::ReviewDraft;

/// Maximum length for draft titles (255 characters)
pub const MAX_TITLE_LENGTH: usize = 255;

/// Maximum length for slugs (255 characters)
pub const MAX_SLUG_LENGTH: usize = 255;

/// Maximum length for the optional description (1000 characters)
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;

/// Fields whose errors block marking a file for approval.
pub const REQUIRED_FIELDS: &[DraftField] = &[DraftField::Title, DraftField::Tags];

fn slug_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[a-z0-9-]+$").expect("valid slug pattern"))
}

/// Draft fields subject to validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftField {
    Title,
    Slug,
    Tags,
    Description,
}

impl DraftField {
    pub fn as_str(&self) -> &'static str {
        match self {
            DraftField::Title => "title",
            DraftField::Slug => "slug",
            DraftField::Tags => "tags",
            DraftField::Description => "description",
        }
    }
}

/// Per-file validation errors: field name -> message. At most one message
/// per field; the first failing rule wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors(BTreeMap<String, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn remove(&mut self, field: &str) {
        self.0.remove(field);
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Overlay `other` onto self; entries in `other` win on conflict.
    /// Used to map server-reported errors over locally computed ones.
    pub fn merge(&mut self, other: FieldErrors) {
        self.0.extend(other.0);
    }
}

/// Validate a single field of a draft. Returns the error message, or `None`
/// when the field is valid.
pub fn validate_field(field: DraftField, draft: &ReviewDraft) -> Option<String> {
    match field {
        DraftField::Title => validate_title(&draft.title),
        DraftField::Slug => validate_slug(&draft.slug),
        DraftField::Tags => validate_tag_count(draft.tags.len()),
        DraftField::Description => validate_description(draft.description.as_deref()),
    }
}

pub fn validate_title(title: &str) -> Option<String> {
    if title.trim().is_empty() {
        return Some("Title is required".to_string());
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Some(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LENGTH
        ));
    }
    None
}

/// An empty slug is valid here: it is always regenerated from the title
/// before any use.
pub fn validate_slug(slug: &str) -> Option<String> {
    if slug.is_empty() {
        return None;
    }
    if !slug_pattern().is_match(slug) {
        return Some(
            "Slug may only contain lowercase letters, digits, and hyphens".to_string(),
        );
    }
    if slug.chars().count() > MAX_SLUG_LENGTH {
        return Some(format!("Slug must be at most {} characters", MAX_SLUG_LENGTH));
    }
    None
}

pub fn validate_tag_count(count: usize) -> Option<String> {
    if count == 0 {
        return Some("At least one tag is required".to_string());
    }
    None
}

pub fn validate_description(description: Option<&str>) -> Option<String> {
    match description {
        Some(text) if text.chars().count() > MAX_DESCRIPTION_LENGTH => Some(format!(
            "Description must be at most {} characters",
            MAX_DESCRIPTION_LENGTH
        )),
        _ => None,
    }
}

/// Evaluate every validated field of a draft.
pub fn validate_draft(draft: &ReviewDraft) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for field in [
        DraftField::Title,
        DraftField::Slug,
        DraftField::Tags,
        DraftField::Description,
    ] {
        if let Some(message) = validate_field(field, draft) {
            errors.insert(field.as_str(), message);
        }
    }
    errors
}

/// Evaluate only the fields that gate approval (title and tags).
pub fn required_field_errors(draft: &ReviewDraft) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for field in REQUIRED_FIELDS {
        if let Some(message) = validate_field(*field, draft) {
            errors.insert(field.as_str(), message);
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_required() {
        assert_eq!(validate_title(""), Some("Title is required".to_string()));
        assert_eq!(validate_title("   "), Some("Title is required".to_string()));
        assert_eq!(validate_title("Sunset"), None);
    }

    #[test]
    fn test_title_max_length() {
        let long = "a".repeat(MAX_TITLE_LENGTH + 1);
        assert!(validate_title(&long).is_some());
        let ok = "a".repeat(MAX_TITLE_LENGTH);
        assert_eq!(validate_title(&ok), None);
    }

    #[test]
    fn test_slug_charset() {
        assert_eq!(validate_slug("my-photo-2"), None);
        assert!(validate_slug("My-Photo").is_some());
        assert!(validate_slug("my photo").is_some());
        assert!(validate_slug("my_photo").is_some());
    }

    #[test]
    fn test_slug_empty_is_valid() {
        assert_eq!(validate_slug(""), None);
    }

    #[test]
    fn test_tags_required() {
        assert_eq!(
            validate_tag_count(0),
            Some("At least one tag is required".to_string())
        );
        assert_eq!(validate_tag_count(3), None);
    }

    #[test]
    fn test_description_optional() {
        assert_eq!(validate_description(None), None);
        assert_eq!(validate_description(Some("short")), None);
        let long = "d".repeat(MAX_DESCRIPTION_LENGTH + 1);
        assert!(validate_description(Some(&long)).is_some());
    }

    #[test]
    fn test_field_errors_merge_prefers_incoming() {
        let mut local = FieldErrors::new();
        local.insert("title", "Title is required");
        local.insert("tags", "At least one tag is required");

        let mut server = FieldErrors::new();
        server.insert("title", "Title already exists");

        local.merge(server);
        assert_eq!(local.get("title"), Some("Title already exists"));
        assert_eq!(local.get("tags"), Some("At least one tag is required"));
    }
}
