use serde::{Deserialize, Serialize};

/// State of one exam attempt.
///
/// The loading phase is not represented here: an engine only exists once
/// assembly succeeded, so "still loading" is a pending start call and a
/// failed load is its error. Review is a view toggle over a finished
/// attempt, reachable in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExamPhase {
    Answering,
    Finished,
    Reviewing,
}

impl ExamPhase {
    /// True while the countdown is allowed to decrement.
    #[must_use]
    pub fn is_answering(self) -> bool {
        matches!(self, ExamPhase::Answering)
    }

    /// True once a result exists, in either the result or review view.
    #[must_use]
    pub fn is_scored(self) -> bool {
        matches!(self, ExamPhase::Finished | ExamPhase::Reviewing)
    }
}
