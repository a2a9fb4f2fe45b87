use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// File kind enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    Image,
    Video,
    Audio,
    Document,
    Archive,
    Other,
}

/// Immutable snapshot of an uploaded file awaiting review. Created
/// server-side on upload; removed from the pending set once a batch commits
/// its approval or rejection, or when it expires server-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingFile {
    pub id: Uuid,
    pub original_filename: String,
    pub file_kind: FileKind,
    pub file_size: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub ai_suggested_title: Option<String>,
    pub ai_suggested_tags: Option<Vec<String>>,
}

impl PendingFile {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Filename without its final extension, used as the fallback title
    /// when no AI suggestion is present.
    pub fn filename_stem(&self) -> &str {
        match self.original_filename.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.original_filename,
        }
    }
}

/// Sort field for the pending-file list call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingSortField {
    CreatedAt,
    ExpiresAt,
    Filename,
    FileSize,
}

impl PendingSortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            PendingSortField::CreatedAt => "created_at",
            PendingSortField::ExpiresAt => "expires_at",
            PendingSortField::Filename => "filename",
            PendingSortField::FileSize => "file_size",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Status filter for the pending-file list call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingStatusFilter {
    All,
    ExpiringSoon,
}

impl PendingStatusFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            PendingStatusFilter::All => "all",
            PendingStatusFilter::ExpiringSoon => "expiring_soon",
        }
    }
}

/// Query for the repository list call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListPendingQuery {
    pub namespace: String,
    pub search: Option<String>,
    pub sort: PendingSortField,
    pub direction: SortDirection,
    pub status: PendingStatusFilter,
}

impl ListPendingQuery {
    pub fn namespace(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            search: None,
            sort: PendingSortField::CreatedAt,
            direction: SortDirection::Desc,
            status: PendingStatusFilter::All,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(filename: &str) -> PendingFile {
        PendingFile {
            id: Uuid::new_v4(),
            original_filename: filename.to_string(),
            file_kind: FileKind::Image,
            file_size: 1024,
            created_at: Utc::now(),
            expires_at: Utc::now() + chrono::Duration::days(7),
            ai_suggested_title: None,
            ai_suggested_tags: None,
        }
    }

    #[test]
    fn test_filename_stem() {
        assert_eq!(pending("IMG_1234.jpg").filename_stem(), "IMG_1234");
        assert_eq!(pending("archive.tar.gz").filename_stem(), "archive.tar");
        assert_eq!(pending("noext").filename_stem(), "noext");
        assert_eq!(pending(".hidden").filename_stem(), ".hidden");
    }

    #[test]
    fn test_is_expired() {
        let mut file = pending("a.jpg");
        assert!(!file.is_expired(Utc::now()));
        file.expires_at = Utc::now() - chrono::Duration::minutes(1);
        assert!(file.is_expired(Utc::now()));
    }
}
