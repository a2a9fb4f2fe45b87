//! In-memory fakes for the review pipeline's ports, so the session can be
//! driven without a server.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use curata_core::models::{
    ApproveRequest, FileKind, ListPendingQuery, Notification, PendingFile, Severity, Tag,
};
use curata_core::slug::slugify;
use curata_core::validation::FieldErrors;
use curata_core::{AppError, CommitError, ReviewConfig};
use curata_review::{Notifier, PendingFileRepository, ReviewSession, SlugResolver, TagDirectory};

pub fn pending_file(filename: &str) -> PendingFile {
    pending_file_with(filename, None, None)
}

pub fn pending_file_with(
    filename: &str,
    title: Option<&str>,
    tags: Option<Vec<&str>>,
) -> PendingFile {
    PendingFile {
        id: Uuid::new_v4(),
        original_filename: filename.to_string(),
        file_kind: FileKind::Image,
        file_size: 2048,
        created_at: Utc::now(),
        expires_at: Utc::now() + chrono::Duration::days(7),
        ai_suggested_title: title.map(String::from),
        ai_suggested_tags: tags.map(|t| t.into_iter().map(String::from).collect()),
    }
}

/// Fake pending-file repository. Approved and rejected files leave the
/// pending set, as they would server-side once the batch commits.
#[derive(Clone, Default)]
pub struct FakeFileRepository {
    files: Arc<Mutex<Vec<PendingFile>>>,
    approve_failures: Arc<Mutex<HashMap<Uuid, (String, Option<FieldErrors>)>>>,
    approve_delay: Arc<Mutex<Option<Duration>>>,
    pub approved: Arc<Mutex<Vec<ApproveRequest>>>,
    pub rejected: Arc<Mutex<Vec<Uuid>>>,
    /// Interleaved call log ("approve:<id>" / "reject:<id>").
    pub ops: Arc<Mutex<Vec<String>>>,
}

impl FakeFileRepository {
    pub fn with_files(files: Vec<PendingFile>) -> Self {
        Self {
            files: Arc::new(Mutex::new(files)),
            ..Self::default()
        }
    }

    pub fn fail_approve(&self, id: Uuid, message: &str, field_errors: Option<FieldErrors>) {
        self.approve_failures
            .lock()
            .unwrap()
            .insert(id, (message.to_string(), field_errors));
    }

    pub fn set_approve_delay(&self, delay: Duration) {
        *self.approve_delay.lock().unwrap() = Some(delay);
    }

    pub fn pending_ids(&self) -> Vec<Uuid> {
        self.files.lock().unwrap().iter().map(|f| f.id).collect()
    }
}

#[async_trait]
impl PendingFileRepository for FakeFileRepository {
    async fn list(&self, _query: &ListPendingQuery) -> Result<Vec<PendingFile>, AppError> {
        Ok(self.files.lock().unwrap().clone())
    }

    async fn get(&self, id: Uuid) -> Result<Option<PendingFile>, AppError> {
        Ok(self
            .files
            .lock()
            .unwrap()
            .iter()
            .find(|f| f.id == id)
            .cloned())
    }

    async fn approve(&self, request: &ApproveRequest) -> Result<(), CommitError> {
        let delay = *self.approve_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.ops
            .lock()
            .unwrap()
            .push(format!("approve:{}", request.file_id));

        if let Some((message, fields)) = self.approve_failures.lock().unwrap().get(&request.file_id)
        {
            return Err(match fields {
                Some(fields) => CommitError::rejected(message.clone(), fields.clone()),
                None => CommitError::transport(message.clone()),
            });
        }

        self.approved.lock().unwrap().push(request.clone());
        self.files
            .lock()
            .unwrap()
            .retain(|f| f.id != request.file_id);
        Ok(())
    }

    async fn reject(&self, id: Uuid) -> Result<(), AppError> {
        self.ops.lock().unwrap().push(format!("reject:{}", id));
        self.rejected.lock().unwrap().push(id);
        self.files.lock().unwrap().retain(|f| f.id != id);
        Ok(())
    }
}

/// Fake slug resolver: slugifies the candidate and appends a numeric suffix
/// until the result avoids `slugs_in_use`. Deterministic for identical
/// inputs. Specific candidates can be overridden, and the whole resolver
/// can be switched to fail.
#[derive(Clone, Default)]
pub struct FakeSlugResolver {
    pub calls: Arc<Mutex<Vec<(String, String, Vec<String>)>>>,
    overrides: Arc<Mutex<HashMap<String, String>>>,
    failing: Arc<Mutex<bool>>,
}

impl FakeSlugResolver {
    pub fn override_candidate(&self, candidate: &str, slug: &str) {
        self.overrides
            .lock()
            .unwrap()
            .insert(candidate.to_string(), slug.to_string());
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn last_call(&self) -> Option<(String, String, Vec<String>)> {
        self.calls.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl SlugResolver for FakeSlugResolver {
    async fn resolve(
        &self,
        title: &str,
        namespace: &str,
        slugs_in_use: &[String],
    ) -> Result<String, AppError> {
        self.calls.lock().unwrap().push((
            title.to_string(),
            namespace.to_string(),
            slugs_in_use.to_vec(),
        ));

        if *self.failing.lock().unwrap() {
            return Err(AppError::SlugResolution("resolver unavailable".to_string()));
        }
        if let Some(slug) = self.overrides.lock().unwrap().get(title) {
            return Ok(slug.clone());
        }

        let base = slugify(title);
        let mut candidate = base.clone();
        let mut suffix = 2;
        while slugs_in_use.contains(&candidate) {
            candidate = format!("{}-{}", base, suffix);
            suffix += 1;
        }
        Ok(candidate)
    }
}

#[derive(Clone, Default)]
pub struct FakeTagDirectory {
    pub tags: Arc<Mutex<Vec<Tag>>>,
}

impl FakeTagDirectory {
    pub fn with_tags(names: &[&str]) -> Self {
        let tags = names
            .iter()
            .map(|name| Tag {
                id: Uuid::new_v4(),
                name: name.to_string(),
            })
            .collect();
        Self {
            tags: Arc::new(Mutex::new(tags)),
        }
    }
}

#[async_trait]
impl TagDirectory for FakeTagDirectory {
    async fn search(&self, _namespace: &str, query: &str) -> Result<Vec<Tag>, AppError> {
        Ok(self
            .tags
            .lock()
            .unwrap()
            .iter()
            .filter(|t| t.name.contains(query))
            .cloned()
            .collect())
    }
}

#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub notifications: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .map(|n| n.message.clone())
            .collect()
    }

    pub fn has_message_containing(&self, fragment: &str) -> bool {
        self.messages().iter().any(|m| m.contains(fragment))
    }

    pub fn count_with_severity(&self, severity: Severity) -> usize {
        self.notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.severity == severity)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }
}

/// A loaded session plus handles to every fake behind it.
pub struct TestHarness {
    pub session: ReviewSession,
    pub repo: FakeFileRepository,
    pub resolver: FakeSlugResolver,
    pub directory: FakeTagDirectory,
    pub notifier: RecordingNotifier,
}

impl TestHarness {
    pub fn file_id(&self, index: usize) -> Uuid {
        self.session.files()[index].id
    }
}

pub async fn harness(files: Vec<PendingFile>) -> TestHarness {
    harness_with_directory(files, FakeTagDirectory::default()).await
}

pub async fn harness_with_directory(
    files: Vec<PendingFile>,
    directory: FakeTagDirectory,
) -> TestHarness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();

    let repo = FakeFileRepository::with_files(files);
    let resolver = FakeSlugResolver::default();
    let notifier = RecordingNotifier::default();

    let session = ReviewSession::new(
        Arc::new(repo.clone()),
        Arc::new(resolver.clone()),
        Arc::new(directory.clone()),
        Arc::new(notifier.clone()),
        ReviewConfig::default(),
    );
    session
        .load(ListPendingQuery::namespace("default"))
        .await
        .expect("load pending list");

    TestHarness {
        session,
        repo,
        resolver,
        directory,
        notifier,
    }
}
