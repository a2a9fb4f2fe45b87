use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Review decision for a pending file. Exactly one state per file at any
/// time; approve and reject never transition into each other directly, only
/// through `Unmarked`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Decision {
    #[default]
    Unmarked,
    Approve {
        at: DateTime<Utc>,
    },
    Reject {
        at: DateTime<Utc>,
    },
}

impl Decision {
    pub fn is_unmarked(&self) -> bool {
        matches!(self, Decision::Unmarked)
    }

    pub fn is_approve(&self) -> bool {
        matches!(self, Decision::Approve { .. })
    }

    pub fn is_reject(&self) -> bool {
        matches!(self, Decision::Reject { .. })
    }
}

/// Per-file slug negotiation annotation.
///
/// `Pending` means the debounce timer is armed, `Validating` means the
/// resolver call is in flight. `Resolved` records a server rewrite that the
/// operator has not re-confirmed yet; it is informational and does not block
/// approval by itself, but `mark_for_approval` withholds the decision on the
/// round trip that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum SlugNegotiation {
    #[default]
    Idle,
    Pending,
    Validating,
    Resolved {
        original_slug: String,
        resolved_slug: String,
        at: DateTime<Utc>,
    },
}

impl SlugNegotiation {
    /// True while a debounce timer is armed or a resolver call is in flight.
    pub fn is_active(&self) -> bool {
        matches!(self, SlugNegotiation::Pending | SlugNegotiation::Validating)
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, SlugNegotiation::Resolved { .. })
    }
}
