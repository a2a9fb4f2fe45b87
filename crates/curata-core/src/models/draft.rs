use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pending_file::PendingFile;
use super::tag::{merge_tags, TagRef};
use crate::slug::slugify;

/// Access level enum
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    #[default]
    Public,
    Members,
    Staff,
    Private,
}

/// Target collection for an approved file: none, an existing collection, or
/// a collection the server should create under the given name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionTarget {
    #[default]
    None,
    Existing(Uuid),
    New(String),
}

/// Operator-editable metadata for one pending file during review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewDraft {
    pub title: String,
    pub slug: String,
    /// Set when the operator edited the slug directly; cleared when the
    /// title changes (which re-derives the slug).
    pub slug_overridden: bool,
    /// Ordered, deduplicated by name.
    pub tags: Vec<TagRef>,
    pub access_level: AccessLevel,
    pub description: Option<String>,
    pub collection: CollectionTarget,
}

impl ReviewDraft {
    /// Seed a draft from a pending file: AI-suggested title and tags when
    /// present, filename stem otherwise; slug derived from the title.
    pub fn seeded_from(file: &PendingFile) -> Self {
        let title = file
            .ai_suggested_title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| file.filename_stem().to_string());

        let mut tags = Vec::new();
        if let Some(suggested) = &file.ai_suggested_tags {
            let drafts: Vec<TagRef> = suggested
                .iter()
                .filter(|name| !name.trim().is_empty())
                .map(|name| TagRef::draft(name.as_str()))
                .collect();
            merge_tags(&mut tags, &drafts);
        }

        Self {
            slug: slugify(&title),
            title,
            slug_overridden: false,
            tags,
            access_level: AccessLevel::default(),
            description: None,
            collection: CollectionTarget::default(),
        }
    }

    /// The slug that would be committed: the draft's slug, or, when empty,
    /// one regenerated from the title.
    pub fn effective_slug(&self) -> String {
        if self.slug.is_empty() {
            slugify(&self.title)
        } else {
            self.slug.clone()
        }
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name == name)
    }
}
