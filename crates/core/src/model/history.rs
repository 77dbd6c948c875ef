use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::collections::VecDeque;

use crate::model::QuestionId;

/// Maximum number of past assemblies the usage history remembers.
pub const USAGE_HISTORY_CAP: usize = 10;

/// Bounded record of recently served question ids, most recent first.
///
/// Used only to bias sampling away from questions seen in the last few
/// sessions; it is not a correctness constraint, so a missing or corrupt
/// stored value simply means an empty history.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UsageHistory {
    entries: VecDeque<Vec<QuestionId>>,
}

impl UsageHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries, most recent first.
    pub fn entries(&self) -> impl Iterator<Item = &[QuestionId]> {
        self.entries.iter().map(Vec::as_slice)
    }

    /// Record the ids served by one assembly, evicting the oldest entry
    /// beyond the cap.
    pub fn push_recent(&mut self, ids: Vec<QuestionId>) {
        self.entries.push_front(ids);
        self.entries.truncate(USAGE_HISTORY_CAP);
    }

    /// Every id mentioned anywhere in the history, flattened into one
    /// exclusion set.
    #[must_use]
    pub fn excluded_ids(&self) -> HashSet<&QuestionId> {
        self.entries.iter().flatten().collect()
    }
}
