//! Slug negotiation engine.
//!
//! Each edit arms a per-file, cancellable deferred task; arming a new timer
//! for a file cancels the previous one, so at most one resolver round trip
//! per file is live. Every slot carries a generation number that is checked
//! before and after the network call: a stale response can never overwrite
//! a fresher edit.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

use chrono::Utc;
use tokio::task::AbortHandle;
use uuid::Uuid;

use curata_core::models::{Notification, SlugNegotiation};
use curata_core::validation::DraftField;

use crate::session::SessionInner;

/// Which edit path armed the timer. The title path resolves the title; the
/// manual path resolves the slug text the operator typed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NegotiationTrigger {
    Title,
    ManualSlug,
}

struct TimerSlot {
    generation: u64,
    abort: AbortHandle,
}

#[derive(Default)]
struct TimerTable {
    slots: HashMap<Uuid, TimerSlot>,
    next_generation: u64,
}

/// Per-file timer slots, owned by the session. The table lock is held while
/// a replacement task is spawned so the new task cannot observe the table
/// before its own slot is registered.
#[derive(Default)]
pub(crate) struct NegotiationTimers {
    table: Mutex<TimerTable>,
}

impl NegotiationTimers {
    fn table(&self) -> std::sync::MutexGuard<'_, TimerTable> {
        self.table.lock().expect("negotiation timer table poisoned")
    }

    /// Register a new timer for a file, cancelling any previous one.
    /// `spawn` receives the slot's generation and returns the abort handle
    /// of the spawned task.
    fn arm(&self, file_id: Uuid, spawn: impl FnOnce(u64) -> AbortHandle) {
        let mut table = self.table();
        table.next_generation += 1;
        let generation = table.next_generation;
        if let Some(previous) = table.slots.remove(&file_id) {
            previous.abort.abort();
        }
        let abort = spawn(generation);
        table.slots.insert(file_id, TimerSlot { generation, abort });
    }

    pub(crate) fn cancel(&self, file_id: Uuid) {
        if let Some(slot) = self.table().slots.remove(&file_id) {
            slot.abort.abort();
        }
    }

    pub(crate) fn cancel_all(&self) {
        let mut table = self.table();
        for (_, slot) in table.slots.drain() {
            slot.abort.abort();
        }
    }

    pub(crate) fn armed(&self, file_id: Uuid) -> bool {
        self.table().slots.contains_key(&file_id)
    }

    fn matches(&self, file_id: Uuid, generation: u64) -> bool {
        self.table()
            .slots
            .get(&file_id)
            .is_some_and(|slot| slot.generation == generation)
    }

    /// Retire a slot after its task completed, unless a newer timer
    /// replaced it in the meantime.
    fn finish(&self, file_id: Uuid, generation: u64) {
        let mut table = self.table();
        if table
            .slots
            .get(&file_id)
            .is_some_and(|slot| slot.generation == generation)
        {
            table.slots.remove(&file_id);
        }
    }
}

impl SessionInner {
    /// Arm the debounce timer for a file. The spawned task holds only a
    /// weak reference to the session; dropping the session (navigating
    /// away) orphans the timer harmlessly.
    pub(crate) fn arm_timer(self: Arc<Self>, file_id: Uuid, trigger: NegotiationTrigger) {
        let delay = match trigger {
            NegotiationTrigger::Title => self.config.title_debounce,
            NegotiationTrigger::ManualSlug => self.config.manual_slug_debounce,
        };
        let weak: Weak<SessionInner> = Arc::downgrade(&self);
        self.timers.arm(file_id, move |generation| {
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                inner.run_negotiation(file_id, generation, trigger).await;
            })
            .abort_handle()
        });
    }

    /// The timer body: snapshot the freshest inputs, call the resolver, and
    /// apply the outcome unless a newer edit superseded this slot.
    pub(crate) async fn run_negotiation(
        self: Arc<Self>,
        file_id: Uuid,
        generation: u64,
        trigger: NegotiationTrigger,
    ) {
        if !self.timers.matches(file_id, generation) {
            return;
        }

        let (candidate, sent_slug, namespace, slugs_in_use, filename) = {
            let mut state = self.state();
            let Some(draft) = state.drafts.get(&file_id) else {
                self.timers.finish(file_id, generation);
                return;
            };
            let candidate = match trigger {
                NegotiationTrigger::Title => draft.title.clone(),
                NegotiationTrigger::ManualSlug => draft.slug.clone(),
            };
            let sent_slug = draft.slug.clone();
            let filename = state.display_name(file_id);
            let namespace = state.namespace.clone();
            let slugs_in_use = state.slugs_in_use_excluding(file_id);
            state
                .negotiations
                .insert(file_id, SlugNegotiation::Validating);
            (candidate, sent_slug, namespace, slugs_in_use, filename)
        };

        let result = self
            .resolver
            .resolve(&candidate, &namespace, &slugs_in_use)
            .await;

        if !self.timers.matches(file_id, generation) {
            // a newer edit armed a fresh timer while we were in flight
            return;
        }
        self.timers.finish(file_id, generation);

        let mut state = self.state();
        if !matches!(
            state.negotiations.get(&file_id),
            Some(SlugNegotiation::Validating)
        ) {
            return;
        }
        let Some(draft) = state.drafts.get_mut(&file_id) else {
            return;
        };

        match result {
            Ok(resolved) if resolved != sent_slug => {
                draft.slug = resolved.clone();
                state.negotiations.insert(
                    file_id,
                    SlugNegotiation::Resolved {
                        original_slug: sent_slug.clone(),
                        resolved_slug: resolved.clone(),
                        at: Utc::now(),
                    },
                );
                state.revalidate_field(file_id, DraftField::Slug);
                drop(state);
                tracing::debug!(
                    file_id = %file_id,
                    original = %sent_slug,
                    resolved = %resolved,
                    "slug renamed by resolver"
                );
                self.notify(Notification::warning(format!(
                    "Slug for '{}' was changed to '{}' to keep it unique",
                    filename, resolved
                )));
            }
            Ok(_) => {
                state.negotiations.remove(&file_id);
            }
            Err(e) => {
                // keep the client-derived slug already in the draft
                state.negotiations.remove(&file_id);
                drop(state);
                tracing::warn!(
                    file_id = %file_id,
                    error = %e,
                    "slug resolution failed; keeping client-derived slug"
                );
                self.notify(Notification::error(format!(
                    "Could not validate slug for '{}'; keeping '{}'",
                    filename, sent_slug
                )));
            }
        }
    }
}
