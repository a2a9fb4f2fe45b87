use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::draft::{AccessLevel, CollectionTarget, ReviewDraft};
use super::tag::TagSelector;

/// Request payload for the repository's approve operation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ApproveRequest {
    pub file_id: Uuid,
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: String,
    #[validate(length(min = 1, max = 255, message = "Slug must be between 1 and 255 characters"))]
    pub slug: String,
    /// Existing tag ids, or names for tags the server should create.
    pub tag_ids: Vec<TagSelector>,
    pub access_level: AccessLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
}

impl ApproveRequest {
    /// Build the commit payload for a draft. The slug is regenerated from
    /// the title when the draft's slug is empty.
    pub fn from_draft(file_id: Uuid, draft: &ReviewDraft) -> Self {
        let (collection_id, collection_name) = match &draft.collection {
            CollectionTarget::None => (None, None),
            CollectionTarget::Existing(id) => (Some(*id), None),
            CollectionTarget::New(name) => (None, Some(name.clone())),
        };

        Self {
            file_id,
            title: draft.title.clone(),
            slug: draft.effective_slug(),
            tag_ids: draft.tags.iter().map(TagSelector::from).collect(),
            access_level: draft.access_level,
            collection_id,
            collection_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tag::TagRef;

    fn draft() -> ReviewDraft {
        ReviewDraft {
            title: "My Photo".to_string(),
            slug: String::new(),
            slug_overridden: false,
            tags: vec![TagRef::draft("travel")],
            access_level: AccessLevel::Members,
            description: None,
            collection: CollectionTarget::New("Summer 2026".to_string()),
        }
    }

    #[test]
    fn test_from_draft_regenerates_empty_slug() {
        let request = ApproveRequest::from_draft(Uuid::new_v4(), &draft());
        assert_eq!(request.slug, "my-photo");
        assert_eq!(request.access_level, AccessLevel::Members);
        assert_eq!(request.collection_id, None);
        assert_eq!(request.collection_name.as_deref(), Some("Summer 2026"));
    }

    #[test]
    fn test_wire_shape_omits_absent_collection() {
        let mut d = draft();
        d.collection = CollectionTarget::None;
        let request = ApproveRequest::from_draft(Uuid::new_v4(), &d);
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("collection_id").is_none());
        assert!(json.get("collection_name").is_none());
        assert_eq!(json["tag_ids"][0], serde_json::json!("travel"));
    }
}
