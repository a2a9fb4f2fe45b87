//! Review session: the draft store plus the operations the operator drives.
//!
//! One session owns the review screen's state for a namespace: per-file
//! drafts seeded from the pending list, the sparse validation-error map,
//! decisions, the selection set, and the bulk-tag buffer. All local edits
//! are synchronous; only slug resolution, tag lookups, and batch submission
//! suspend.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use uuid::Uuid;

use curata_core::models::{
    AccessLevel, CollectionTarget, Decision, ListPendingQuery, Notification, PendingFile,
    ReviewDraft, SlugNegotiation, TagRef,
};
use curata_core::slug::slugify;
use curata_core::validation::{self, DraftField, FieldErrors, REQUIRED_FIELDS};
use curata_core::{AppError, ReviewConfig};

use crate::negotiation::{NegotiationTimers, NegotiationTrigger};
use crate::ports::{Notifier, PendingFileRepository, SlugResolver, TagDirectory};

/// Result of a `mark_for_approval` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalOutcome {
    Approved,
    /// Required-field validation failed; the inline error map was updated
    /// and the decision stays unmarked.
    Invalid,
    /// The server renamed the slug during the confirmation round trip; the
    /// decision is withheld until the operator approves again.
    SlugRenamed {
        original_slug: String,
        resolved_slug: String,
    },
    /// The operator edited the file while the confirmation round trip was
    /// in flight; the stale result was discarded.
    Superseded,
}

/// Result of a `bulk_approve` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BulkApproveOutcome {
    pub approved: usize,
    /// Files whose slug was renamed by the server and now await
    /// re-confirmation.
    pub renamed: usize,
    /// Files that failed the validation gate (always the whole selection or
    /// none of it) or whose confirmation round trip errored.
    pub failed: usize,
}

pub(crate) struct ReviewState {
    pub(crate) namespace: String,
    pub(crate) last_query: ListPendingQuery,
    pub(crate) order: Vec<Uuid>,
    pub(crate) files: HashMap<Uuid, PendingFile>,
    pub(crate) drafts: HashMap<Uuid, ReviewDraft>,
    pub(crate) errors: HashMap<Uuid, FieldErrors>,
    pub(crate) decisions: HashMap<Uuid, Decision>,
    pub(crate) negotiations: HashMap<Uuid, SlugNegotiation>,
    pub(crate) selection: HashSet<Uuid>,
    pub(crate) bulk_tags: Vec<TagRef>,
    pub(crate) submitting: bool,
}

impl ReviewState {
    fn new(namespace: String) -> Self {
        Self {
            last_query: ListPendingQuery::namespace(namespace.clone()),
            namespace,
            order: Vec::new(),
            files: HashMap::new(),
            drafts: HashMap::new(),
            errors: HashMap::new(),
            decisions: HashMap::new(),
            negotiations: HashMap::new(),
            selection: HashSet::new(),
            bulk_tags: Vec::new(),
            submitting: false,
        }
    }

    /// Replace all review state with a freshly listed pending set.
    pub(crate) fn seed(&mut self, query: ListPendingQuery, files: Vec<PendingFile>) {
        self.namespace = query.namespace.clone();
        self.last_query = query;
        self.clear_all();
        for file in files {
            let id = file.id;
            self.order.push(id);
            self.drafts.insert(id, ReviewDraft::seeded_from(&file));
            self.files.insert(id, file);
        }
    }

    /// Drop every draft, decision, error, annotation, selection, and the
    /// bulk buffer. The last query is kept so the list can be refreshed.
    pub(crate) fn clear_all(&mut self) {
        self.order.clear();
        self.files.clear();
        self.drafts.clear();
        self.errors.clear();
        self.decisions.clear();
        self.negotiations.clear();
        self.selection.clear();
        self.bulk_tags.clear();
    }

    pub(crate) fn decision(&self, id: Uuid) -> Decision {
        self.decisions.get(&id).copied().unwrap_or_default()
    }

    /// Record a decision, keeping the map sparse and the selection
    /// invariant (only unmarked files stay selected).
    pub(crate) fn set_decision(&mut self, id: Uuid, decision: Decision) {
        match decision {
            Decision::Unmarked => {
                self.decisions.remove(&id);
            }
            other => {
                self.decisions.insert(id, other);
                self.selection.remove(&id);
            }
        }
    }

    /// Re-run one field's validator and fold the result into the sparse
    /// error map: valid fields are removed, and a file with no remaining
    /// errors loses its entry entirely.
    pub(crate) fn revalidate_field(&mut self, id: Uuid, field: DraftField) {
        let Some(draft) = self.drafts.get(&id) else {
            return;
        };
        match validation::validate_field(field, draft) {
            Some(message) => {
                self.errors.entry(id).or_default().insert(field.as_str(), message);
            }
            None => {
                if let Some(entry) = self.errors.get_mut(&id) {
                    entry.remove(field.as_str());
                    if entry.is_empty() {
                        self.errors.remove(&id);
                    }
                }
            }
        }
    }

    pub(crate) fn replace_errors(&mut self, id: Uuid, errors: FieldErrors) {
        if errors.is_empty() {
            self.errors.remove(&id);
        } else {
            self.errors.insert(id, errors);
        }
    }

    pub(crate) fn merge_errors(&mut self, id: Uuid, errors: FieldErrors) {
        self.errors.entry(id).or_default().merge(errors);
    }

    /// Slugs currently claimed by every other draft, for the resolver's
    /// local-uniqueness input.
    pub(crate) fn slugs_in_use_excluding(&self, id: Uuid) -> Vec<String> {
        self.order
            .iter()
            .filter(|other| **other != id)
            .filter_map(|other| self.drafts.get(other))
            .map(|draft| draft.effective_slug())
            .filter(|slug| !slug.is_empty())
            .collect()
    }

    pub(crate) fn selected_in_order(&self) -> Vec<Uuid> {
        self.order
            .iter()
            .filter(|id| self.selection.contains(id))
            .copied()
            .collect()
    }

    pub(crate) fn display_name(&self, id: Uuid) -> String {
        self.files
            .get(&id)
            .map(|f| f.original_filename.clone())
            .unwrap_or_else(|| id.to_string())
    }
}

pub(crate) struct SessionInner {
    pub(crate) config: ReviewConfig,
    pub(crate) files: Arc<dyn PendingFileRepository>,
    pub(crate) resolver: Arc<dyn SlugResolver>,
    pub(crate) tags: Arc<dyn TagDirectory>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) state: Mutex<ReviewState>,
    pub(crate) timers: NegotiationTimers,
}

impl SessionInner {
    /// Lock the state. Never held across an await.
    pub(crate) fn state(&self) -> MutexGuard<'_, ReviewState> {
        self.state.lock().expect("review state mutex poisoned")
    }

    pub(crate) fn notify(&self, notification: Notification) {
        self.notifier.notify(notification);
    }
}

/// The pending-media review session. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ReviewSession {
    pub(crate) inner: Arc<SessionInner>,
}

impl ReviewSession {
    pub fn new(
        files: Arc<dyn PendingFileRepository>,
        resolver: Arc<dyn SlugResolver>,
        tags: Arc<dyn TagDirectory>,
        notifier: Arc<dyn Notifier>,
        config: ReviewConfig,
    ) -> Self {
        let state = ReviewState::new(config.namespace.clone());
        Self {
            inner: Arc::new(SessionInner {
                config,
                files,
                resolver,
                tags,
                notifier,
                state: Mutex::new(state),
                timers: NegotiationTimers::default(),
            }),
        }
    }

    /// Seed the session from the repository's pending list. Any previous
    /// review state, including armed negotiation timers, is dropped.
    #[tracing::instrument(skip(self, query), fields(namespace = %query.namespace))]
    pub async fn load(&self, query: ListPendingQuery) -> Result<usize, AppError> {
        let files = self.inner.files.list(&query).await?;
        self.inner.timers.cancel_all();
        let mut state = self.inner.state();
        state.seed(query, files);
        tracing::debug!(count = state.order.len(), "pending list loaded");
        Ok(state.order.len())
    }

    /// Re-list with the query used by the last `load`.
    pub async fn refresh(&self) -> Result<usize, AppError> {
        let query = self.inner.state().last_query.clone();
        self.load(query).await
    }

    // ---- draft edits -------------------------------------------------

    /// Update a title. The slug is immediately re-derived client-side for
    /// instant feedback (clearing any manual override) and the title-path
    /// debounce timer is armed for the server round trip.
    pub fn set_title(&self, id: Uuid, title: impl Into<String>) -> Result<(), AppError> {
        {
            let mut state = self.inner.state();
            let draft = state
                .drafts
                .get_mut(&id)
                .ok_or_else(|| AppError::NotFound(format!("pending file {}", id)))?;
            draft.title = title.into();
            draft.slug = slugify(&draft.title);
            draft.slug_overridden = false;
            state.revalidate_field(id, DraftField::Title);
            state.revalidate_field(id, DraftField::Slug);
            state.negotiations.insert(id, SlugNegotiation::Pending);
        }
        Arc::clone(&self.inner).arm_timer(id, NegotiationTrigger::Title);
        Ok(())
    }

    /// Directly edit a slug. Written through for instant feedback; the
    /// manual-path debounce timer is armed and any resolved annotation is
    /// cleared.
    pub fn set_slug(&self, id: Uuid, slug: impl Into<String>) -> Result<(), AppError> {
        {
            let mut state = self.inner.state();
            let draft = state
                .drafts
                .get_mut(&id)
                .ok_or_else(|| AppError::NotFound(format!("pending file {}", id)))?;
            draft.slug = slug.into();
            draft.slug_overridden = true;
            state.revalidate_field(id, DraftField::Slug);
            state.negotiations.insert(id, SlugNegotiation::Pending);
        }
        Arc::clone(&self.inner).arm_timer(id, NegotiationTrigger::ManualSlug);
        Ok(())
    }

    pub fn set_description(&self, id: Uuid, description: Option<String>) -> Result<(), AppError> {
        let mut state = self.inner.state();
        let draft = state
            .drafts
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("pending file {}", id)))?;
        draft.description = description.filter(|d| !d.is_empty());
        state.revalidate_field(id, DraftField::Description);
        Ok(())
    }

    pub fn set_access_level(&self, id: Uuid, level: AccessLevel) -> Result<(), AppError> {
        let mut state = self.inner.state();
        let draft = state
            .drafts
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("pending file {}", id)))?;
        draft.access_level = level;
        Ok(())
    }

    pub fn set_collection(&self, id: Uuid, collection: CollectionTarget) -> Result<(), AppError> {
        let mut state = self.inner.state();
        let draft = state
            .drafts
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("pending file {}", id)))?;
        draft.collection = collection;
        Ok(())
    }

    /// Attach a tag to a draft; a tag with the same name is a no-op.
    pub fn add_tag(&self, id: Uuid, tag: TagRef) -> Result<(), AppError> {
        let mut state = self.inner.state();
        let draft = state
            .drafts
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("pending file {}", id)))?;
        if !draft.has_tag(&tag.name) {
            draft.tags.push(tag);
        }
        state.revalidate_field(id, DraftField::Tags);
        Ok(())
    }

    pub fn remove_tag(&self, id: Uuid, name: &str) -> Result<(), AppError> {
        let mut state = self.inner.state();
        let draft = state
            .drafts
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("pending file {}", id)))?;
        draft.tags.retain(|t| t.name != name);
        state.revalidate_field(id, DraftField::Tags);
        Ok(())
    }

    // ---- decisions ---------------------------------------------------

    /// Mark a file for approval: the validator gate runs first, then a
    /// final slug-resolver round trip (bypassing the debounce). A server
    /// rename withholds the decision so the operator can review the new
    /// slug before approving again.
    #[tracing::instrument(skip(self))]
    pub async fn mark_for_approval(&self, id: Uuid) -> Result<ApprovalOutcome, AppError> {
        let (candidate, namespace, slugs_in_use, filename) = {
            let mut state = self.inner.state();
            let Some(draft) = state.drafts.get(&id).cloned() else {
                return Err(AppError::NotFound(format!("pending file {}", id)));
            };
            let filename = state.display_name(id);
            if !state.decision(id).is_unmarked() {
                return Err(AppError::InvalidInput(format!(
                    "'{}' already has a decision; unmark it first",
                    filename
                )));
            }

            let errors = validation::validate_draft(&draft);
            let gate_failed = REQUIRED_FIELDS
                .iter()
                .any(|field| errors.get(field.as_str()).is_some());
            state.replace_errors(id, errors);
            if gate_failed {
                drop(state);
                self.inner.notify(Notification::error(format!(
                    "Cannot approve '{}': fix the highlighted fields first",
                    filename
                )));
                return Ok(ApprovalOutcome::Invalid);
            }

            // Identity the operator last saw: the slug text when manually
            // overridden, the title otherwise.
            let candidate = if draft.slug_overridden {
                draft.effective_slug()
            } else {
                draft.title.clone()
            };
            state.negotiations.insert(id, SlugNegotiation::Validating);
            (
                candidate,
                state.namespace.clone(),
                state.slugs_in_use_excluding(id),
                filename,
            )
        };

        // Final uniqueness confirmation, bypassing any armed debounce timer.
        self.inner.timers.cancel(id);
        let resolved = match self
            .inner
            .resolver
            .resolve(&candidate, &namespace, &slugs_in_use)
            .await
        {
            Ok(slug) => slug,
            Err(e) => {
                self.inner.state().negotiations.remove(&id);
                tracing::warn!(file_id = %id, error = %e, "slug confirmation failed");
                self.inner.notify(Notification::error(format!(
                    "Could not confirm slug for '{}': {}",
                    filename, e
                )));
                return Err(e);
            }
        };

        let mut state = self.inner.state();
        if self.inner.timers.armed(id) {
            // the operator kept editing during the round trip
            return Ok(ApprovalOutcome::Superseded);
        }
        let Some(draft) = state.drafts.get_mut(&id) else {
            return Err(AppError::NotFound(format!("pending file {}", id)));
        };

        let current = draft.effective_slug();
        if resolved != current {
            draft.slug = resolved.clone();
            state.negotiations.insert(
                id,
                SlugNegotiation::Resolved {
                    original_slug: current.clone(),
                    resolved_slug: resolved.clone(),
                    at: Utc::now(),
                },
            );
            state.revalidate_field(id, DraftField::Slug);
            drop(state);
            tracing::debug!(file_id = %id, original = %current, resolved = %resolved, "slug renamed on approval");
            self.inner.notify(Notification::warning(format!(
                "Slug for '{}' was changed to '{}'; review it and approve again",
                filename, resolved
            )));
            return Ok(ApprovalOutcome::SlugRenamed {
                original_slug: current,
                resolved_slug: resolved,
            });
        }

        // commit the regenerated slug when the draft's was empty
        draft.slug = current;
        state.negotiations.remove(&id);
        state.set_decision(id, Decision::Approve { at: Utc::now() });
        Ok(ApprovalOutcome::Approved)
    }

    /// Mark a file for rejection. Rejection never requires metadata, but
    /// the file must be unmarked (approve and reject only transition
    /// through unmarked).
    pub fn mark_for_rejection(&self, id: Uuid) -> Result<(), AppError> {
        self.inner.timers.cancel(id);
        let mut state = self.inner.state();
        if !state.drafts.contains_key(&id) {
            return Err(AppError::NotFound(format!("pending file {}", id)));
        }
        if !state.decision(id).is_unmarked() {
            let filename = state.display_name(id);
            return Err(AppError::InvalidInput(format!(
                "'{}' already has a decision; unmark it first",
                filename
            )));
        }
        state.negotiations.remove(&id);
        state.set_decision(id, Decision::Reject { at: Utc::now() });
        Ok(())
    }

    /// Return a file to the unmarked state, cancelling any pending slug
    /// negotiation for it.
    pub fn unmark(&self, id: Uuid) -> Result<(), AppError> {
        self.inner.timers.cancel(id);
        let mut state = self.inner.state();
        if !state.drafts.contains_key(&id) {
            return Err(AppError::NotFound(format!("pending file {}", id)));
        }
        state.negotiations.remove(&id);
        state.set_decision(id, Decision::Unmarked);
        Ok(())
    }

    // ---- selection & bulk tags --------------------------------------

    /// Flip a file's membership in the selection set. Files that already
    /// have a decision are not selectable; toggling them is a no-op.
    /// Returns whether the file is selected afterwards.
    pub fn toggle_selection(&self, id: Uuid) -> Result<bool, AppError> {
        let mut state = self.inner.state();
        if !state.drafts.contains_key(&id) {
            return Err(AppError::NotFound(format!("pending file {}", id)));
        }
        if !state.decision(id).is_unmarked() {
            return Ok(false);
        }
        if state.selection.remove(&id) {
            Ok(false)
        } else {
            state.selection.insert(id);
            Ok(true)
        }
    }

    /// Select every unmarked file. Returns the selection size.
    pub fn select_all(&self) -> usize {
        let mut state = self.inner.state();
        let unmarked: Vec<Uuid> = state
            .order
            .iter()
            .filter(|id| state.decision(**id).is_unmarked())
            .copied()
            .collect();
        state.selection = unmarked.into_iter().collect();
        state.selection.len()
    }

    pub fn clear_selection(&self) {
        self.inner.state().selection.clear();
    }

    /// Stage a tag for bulk application. The name is resolved against the
    /// tag directory: an exact match contributes its real id, anything else
    /// becomes a draft tag the server will create at approval.
    pub async fn stage_bulk_tag(&self, name: &str) -> Result<(), AppError> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::InvalidInput("Tag name cannot be empty".to_string()));
        }
        let namespace = {
            let state = self.inner.state();
            if state.bulk_tags.iter().any(|t| t.name == name) {
                return Ok(());
            }
            state.namespace.clone()
        };

        let tag = match self.inner.tags.search(&namespace, &name).await {
            Ok(matches) => matches
                .into_iter()
                .find(|t| t.name == name)
                .map(TagRef::from)
                .unwrap_or_else(|| TagRef::draft(name.as_str())),
            Err(e) => {
                tracing::warn!(error = %e, tag = %name, "tag lookup failed; staging as new tag");
                self.inner.notify(Notification::warning(format!(
                    "Tag lookup failed; '{}' will be created on approval",
                    name
                )));
                TagRef::draft(name.as_str())
            }
        };

        let mut state = self.inner.state();
        if !state.bulk_tags.iter().any(|t| t.name == tag.name) {
            state.bulk_tags.push(tag);
        }
        Ok(())
    }

    pub fn unstage_bulk_tag(&self, name: &str) {
        self.inner.state().bulk_tags.retain(|t| t.name != name);
    }

    pub fn clear_bulk_tags(&self) {
        self.inner.state().bulk_tags.clear();
    }

    /// Merge the staged tags into every selected draft, deduplicated by
    /// name with each draft's existing tags winning. Decisions are not
    /// touched; the buffer is cleared after application. Returns the number
    /// of drafts updated.
    pub fn apply_bulk_tags(&self) -> Result<usize, AppError> {
        let mut state = self.inner.state();
        if state.bulk_tags.is_empty() {
            return Err(AppError::InvalidInput("No tags staged for bulk apply".to_string()));
        }
        let selected = state.selected_in_order();
        if selected.is_empty() {
            return Err(AppError::InvalidInput("No files selected".to_string()));
        }

        let staged = state.bulk_tags.clone();
        for id in &selected {
            if let Some(draft) = state.drafts.get_mut(id) {
                curata_core::models::merge_tags(&mut draft.tags, &staged);
            }
            state.revalidate_field(*id, DraftField::Tags);
        }
        state.bulk_tags.clear();
        let count = selected.len();
        drop(state);

        self.inner.notify(Notification::success(format!(
            "Applied {} tag(s) to {} file(s)",
            staged.len(),
            count
        )));
        Ok(count)
    }

    /// Approve every selected file. The validation gate is all-or-nothing:
    /// if any selected file is missing required fields, nothing is marked
    /// and a single aggregated error is emitted. Past the gate, each file
    /// still performs its own slug-confirmation round trip.
    #[tracing::instrument(skip(self))]
    pub async fn bulk_approve(&self) -> Result<BulkApproveOutcome, AppError> {
        let selected = {
            let mut state = self.inner.state();
            let selected = state.selected_in_order();
            if selected.is_empty() {
                drop(state);
                self.inner
                    .notify(Notification::info("No files selected for approval"));
                return Ok(BulkApproveOutcome::default());
            }

            let mut invalid = Vec::new();
            for id in &selected {
                let Some(draft) = state.drafts.get(id) else {
                    continue;
                };
                let errors = validation::required_field_errors(draft);
                if !errors.is_empty() {
                    state.merge_errors(*id, errors);
                    invalid.push(state.display_name(*id));
                }
            }
            if !invalid.is_empty() {
                let failed = invalid.len();
                drop(state);
                self.inner.notify(Notification::error(format!(
                    "Cannot approve selection: {} file(s) are missing required fields ({})",
                    failed,
                    invalid.join(", ")
                )));
                return Ok(BulkApproveOutcome {
                    approved: 0,
                    renamed: 0,
                    failed,
                });
            }
            selected
        };

        let mut outcome = BulkApproveOutcome::default();
        for id in selected {
            match self.mark_for_approval(id).await {
                Ok(ApprovalOutcome::Approved) => outcome.approved += 1,
                Ok(ApprovalOutcome::SlugRenamed { .. }) => outcome.renamed += 1,
                Ok(ApprovalOutcome::Invalid) | Ok(ApprovalOutcome::Superseded) => {
                    outcome.failed += 1;
                }
                Err(e) => {
                    outcome.failed += 1;
                    tracing::warn!(file_id = %id, error = %e, "bulk approval item failed");
                }
            }
        }
        self.clear_selection();

        if outcome.approved > 0 {
            self.inner.notify(Notification::success(format!(
                "Approved {} file(s)",
                outcome.approved
            )));
        }
        if outcome.renamed > 0 {
            self.inner.notify(Notification::warning(format!(
                "{} file(s) had their slug renamed and need re-approval",
                outcome.renamed
            )));
        }
        Ok(outcome)
    }

    // ---- accessors ---------------------------------------------------

    /// Pending files in list order.
    pub fn files(&self) -> Vec<PendingFile> {
        let state = self.inner.state();
        state
            .order
            .iter()
            .filter_map(|id| state.files.get(id))
            .cloned()
            .collect()
    }

    pub fn draft(&self, id: Uuid) -> Option<ReviewDraft> {
        self.inner.state().drafts.get(&id).cloned()
    }

    pub fn decision(&self, id: Uuid) -> Decision {
        self.inner.state().decision(id)
    }

    pub fn field_errors(&self, id: Uuid) -> Option<FieldErrors> {
        self.inner.state().errors.get(&id).cloned()
    }

    pub fn negotiation(&self, id: Uuid) -> SlugNegotiation {
        self.inner
            .state()
            .negotiations
            .get(&id)
            .cloned()
            .unwrap_or_default()
    }

    /// Selected file ids in list order.
    pub fn selection(&self) -> Vec<Uuid> {
        self.inner.state().selected_in_order()
    }

    pub fn bulk_tags(&self) -> Vec<TagRef> {
        self.inner.state().bulk_tags.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.state().order.is_empty()
    }
}
