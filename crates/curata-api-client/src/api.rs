//! Domain methods for the Curata API client, plus the `curata-review` port
//! implementations.
//!
//! The server reports commit-time validation failures as a field-keyed map
//! whose values are a message or a list of messages; that shape is
//! normalized here, at the adapter boundary, into the same `FieldErrors`
//! form the local validator produces.

use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use curata_core::models::{ApproveRequest, ListPendingQuery, PendingFile, Tag};
use curata_core::validation::FieldErrors;
use curata_core::{AppError, CommitError};
use curata_review::{PendingFileRepository, SlugResolver, TagDirectory};

use crate::{api_prefix, ApiClient};

/// Pending list response (files plus total count). Matches API handler
/// shape.
#[derive(Debug, Serialize, Deserialize)]
pub struct PendingListResponse {
    pub files: Vec<PendingFile>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
struct SlugResolveRequest<'a> {
    title: &'a str,
    namespace: &'a str,
    slugs_in_use: &'a [String],
}

#[derive(Debug, Deserialize)]
struct SlugResolveResponse {
    slug: String,
}

/// Error body returned by the approve endpoint on a rejected commit.
#[derive(Debug, Deserialize)]
struct CommitErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Option<HashMap<String, MessageOrList>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum MessageOrList {
    One(String),
    Many(Vec<String>),
}

/// Flatten the server's field-error map into `FieldErrors`. The wire field
/// `tag_ids` is folded onto the draft field `tags`; message lists are
/// joined.
fn normalize_field_errors(errors: HashMap<String, MessageOrList>) -> FieldErrors {
    let mut normalized = FieldErrors::new();
    for (field, messages) in errors {
        let field = match field.as_str() {
            "tag_ids" | "tagIds" => "tags".to_string(),
            _ => field,
        };
        let message = match messages {
            MessageOrList::One(message) => message,
            MessageOrList::Many(list) => list.join("; "),
        };
        normalized.insert(field, message);
    }
    normalized
}

impl ApiClient {
    /// List pending files in a namespace with search/sort/status filters.
    pub async fn list_pending(&self, query: &ListPendingQuery) -> Result<Vec<PendingFile>> {
        let path = format!(
            "{}/namespaces/{}/pending",
            api_prefix(),
            urlencoding::encode(&query.namespace)
        );

        let mut params: Vec<(&str, String)> = vec![
            ("sort", query.sort.as_str().to_string()),
            ("direction", query.direction.as_str().to_string()),
            ("status", query.status.as_str().to_string()),
        ];
        if let Some(search) = &query.search {
            params.push(("search", search.clone()));
        }

        let response: PendingListResponse = self.get(&path, &params).await?;
        Ok(response.files)
    }

    /// Fetch one pending file. Returns `None` on 404.
    pub async fn get_pending(&self, id: Uuid) -> Result<Option<PendingFile>> {
        let url = self.build_url(&format!("{}/pending/{}", api_prefix(), id));
        let response = self
            .apply_auth(self.client().get(&url))
            .send()
            .await
            .with_context(|| format!("GET {} failed", url))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("GET {} returned {}: {}", url, status, body);
        }

        let file = response
            .json::<PendingFile>()
            .await
            .with_context(|| format!("Failed to decode response from {}", url))?;
        Ok(Some(file))
    }

    /// Commit one approval. A client-error response with a field-error body
    /// becomes `CommitError::rejected`; anything else is a transport
    /// failure.
    pub async fn approve_pending(&self, request: &ApproveRequest) -> Result<(), CommitError> {
        if let Err(e) = request.validate() {
            return Err(CommitError::transport(format!(
                "Invalid approve request: {}",
                e
            )));
        }

        let url = self.build_url(&format!(
            "{}/pending/{}/approve",
            api_prefix(),
            request.file_id
        ));

        let response = self
            .apply_auth(self.client().post(&url))
            .json(request)
            .send()
            .await
            .map_err(|e| CommitError::transport(format!("POST {} failed: {}", url, e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_client_error() {
            if let Ok(parsed) = serde_json::from_str::<CommitErrorBody>(&body) {
                if let Some(errors) = parsed.errors {
                    let message = parsed
                        .message
                        .unwrap_or_else(|| "Validation failed".to_string());
                    return Err(CommitError::rejected(message, normalize_field_errors(errors)));
                }
            }
        }
        Err(CommitError::transport(format!(
            "POST {} returned {}: {}",
            url, status, body
        )))
    }

    pub async fn reject_pending(&self, id: Uuid) -> Result<()> {
        self.post_unit(
            &format!("{}/pending/{}/reject", api_prefix(), id),
            &serde_json::json!({}),
        )
        .await
    }

    /// Resolve a candidate title/slug to a namespace-unique slug. Pure
    /// uniqueness check; nothing is reserved server-side.
    pub async fn resolve_slug(
        &self,
        title: &str,
        namespace: &str,
        slugs_in_use: &[String],
    ) -> Result<String> {
        let body = SlugResolveRequest {
            title,
            namespace,
            slugs_in_use,
        };
        let response: SlugResolveResponse = self
            .post(&format!("{}/slugs/resolve", api_prefix()), &body)
            .await?;
        Ok(response.slug)
    }

    /// Search tags in a namespace by free-text query.
    pub async fn search_tags(&self, namespace: &str, query: &str) -> Result<Vec<Tag>> {
        let path = format!(
            "{}/namespaces/{}/tags",
            api_prefix(),
            urlencoding::encode(namespace)
        );
        self.get(&path, &[("q", query.to_string())]).await
    }
}

#[async_trait]
impl PendingFileRepository for ApiClient {
    async fn list(&self, query: &ListPendingQuery) -> Result<Vec<PendingFile>, AppError> {
        self.list_pending(query)
            .await
            .map_err(|e| AppError::Repository(e.to_string()))
    }

    async fn get(&self, id: Uuid) -> Result<Option<PendingFile>, AppError> {
        self.get_pending(id)
            .await
            .map_err(|e| AppError::Repository(e.to_string()))
    }

    async fn approve(&self, request: &ApproveRequest) -> Result<(), CommitError> {
        self.approve_pending(request).await
    }

    async fn reject(&self, id: Uuid) -> Result<(), AppError> {
        self.reject_pending(id)
            .await
            .map_err(|e| AppError::Repository(e.to_string()))
    }
}

#[async_trait]
impl SlugResolver for ApiClient {
    async fn resolve(
        &self,
        title: &str,
        namespace: &str,
        slugs_in_use: &[String],
    ) -> Result<String, AppError> {
        self.resolve_slug(title, namespace, slugs_in_use)
            .await
            .map_err(|e| AppError::SlugResolution(e.to_string()))
    }
}

#[async_trait]
impl TagDirectory for ApiClient {
    async fn search(&self, namespace: &str, query: &str) -> Result<Vec<Tag>, AppError> {
        self.search_tags(namespace, query)
            .await
            .map_err(|e| AppError::TagDirectory(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_single_messages() {
        let body: CommitErrorBody = serde_json::from_str(
            r#"{"message": "Validation failed", "errors": {"title": "Title already exists"}}"#,
        )
        .unwrap();

        let errors = normalize_field_errors(body.errors.unwrap());
        assert_eq!(errors.get("title"), Some("Title already exists"));
    }

    #[test]
    fn test_normalize_message_lists_and_tag_ids() {
        let body: CommitErrorBody = serde_json::from_str(
            r#"{"errors": {"tag_ids": ["Unknown tag", "Tag limit exceeded"], "slug": "Slug taken"}}"#,
        )
        .unwrap();

        let errors = normalize_field_errors(body.errors.unwrap());
        assert_eq!(errors.get("tags"), Some("Unknown tag; Tag limit exceeded"));
        assert_eq!(errors.get("slug"), Some("Slug taken"));
        assert_eq!(errors.get("tag_ids"), None);
    }

    #[test]
    fn test_normalize_camel_case_tag_ids() {
        let mut raw = HashMap::new();
        raw.insert(
            "tagIds".to_string(),
            MessageOrList::One("Unknown tag".to_string()),
        );
        let errors = normalize_field_errors(raw);
        assert_eq!(errors.get("tags"), Some("Unknown tag"));
    }
}
