use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tag that exists in the tag directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
}

/// Identity of a tag attached to a draft. Tags picked from the directory
/// carry their real id; tags typed in by the operator that do not exist yet
/// carry a client-side token until the approve call creates them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TagId {
    Existing(Uuid),
    Draft(String),
}

/// A tag reference held by a review draft: id (real or client-temporary)
/// plus display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRef {
    pub id: TagId,
    pub name: String,
}

impl TagRef {
    pub fn existing(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: TagId::Existing(id),
            name: name.into(),
        }
    }

    /// A not-yet-created tag; the client token is the name itself.
    pub fn draft(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: TagId::Draft(name.clone()),
            name,
        }
    }
}

impl From<Tag> for TagRef {
    fn from(tag: Tag) -> Self {
        TagRef {
            id: TagId::Existing(tag.id),
            name: tag.name,
        }
    }
}

/// Wire form of a tag in the approve payload: an existing tag id, or the
/// name of a tag the server should create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagSelector {
    Id(Uuid),
    Name(String),
}

impl From<&TagRef> for TagSelector {
    fn from(tag: &TagRef) -> Self {
        match &tag.id {
            TagId::Existing(id) => TagSelector::Id(*id),
            TagId::Draft(_) => TagSelector::Name(tag.name.clone()),
        }
    }
}

/// Merge `incoming` into `tags`, deduplicated by case-sensitive name.
/// Existing entries win on conflict; relative order of both lists is kept.
pub fn merge_tags(tags: &mut Vec<TagRef>, incoming: &[TagRef]) {
    for tag in incoming {
        if !tags.iter().any(|t| t.name == tag.name) {
            tags.push(tag.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_tags_dedupes_by_name() {
        let mut tags = vec![TagRef::draft("sunset"), TagRef::draft("beach")];
        let incoming = vec![
            TagRef::existing(Uuid::new_v4(), "beach"),
            TagRef::draft("travel"),
        ];

        merge_tags(&mut tags, &incoming);

        let names: Vec<&str> = tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["sunset", "beach", "travel"]);
        // the pre-existing draft entry wins over the incoming directory tag
        assert_eq!(tags[1].id, TagId::Draft("beach".to_string()));
    }

    #[test]
    fn test_merge_tags_is_case_sensitive() {
        let mut tags = vec![TagRef::draft("Beach")];
        merge_tags(&mut tags, &[TagRef::draft("beach")]);
        assert_eq!(tags.len(), 2);
    }

    #[test]
    fn test_tag_selector_wire_form() {
        let id = Uuid::new_v4();
        let existing = TagRef::existing(id, "beach");
        let draft = TagRef::draft("travel");

        assert_eq!(TagSelector::from(&existing), TagSelector::Id(id));
        assert_eq!(
            TagSelector::from(&draft),
            TagSelector::Name("travel".to_string())
        );
    }
}
