use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResultError {
    #[error("correct count ({correct}) exceeds total ({total})")]
    CountMismatch { correct: u32, total: u32 },

    #[error("score {score} is not correct * points ({expected})")]
    ScoreMismatch { score: u32, expected: u32 },
}

/// Immutable scored summary of one completed attempt.
///
/// Created exactly once per submission; the score is derived from the
/// correct count and the variant's scoring constant, never set directly.
/// Deserialization goes through [`from_persisted`], so a stored entry
/// with tampered counts or score is rejected rather than rehydrated.
///
/// [`from_persisted`]: ExamResult::from_persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PersistedResult")]
pub struct ExamResult {
    name: String,
    correct_count: u32,
    total_count: u32,
    score: u32,
    points_per_question: u32,
    elapsed_seconds: u64,
    completed_at: DateTime<Utc>,
}

/// Wire shape of a stored result, validated before it becomes an
/// [`ExamResult`].
#[derive(Deserialize)]
struct PersistedResult {
    name: String,
    correct_count: u32,
    total_count: u32,
    score: u32,
    points_per_question: u32,
    elapsed_seconds: u64,
    completed_at: DateTime<Utc>,
}

impl TryFrom<PersistedResult> for ExamResult {
    type Error = ResultError;

    fn try_from(raw: PersistedResult) -> Result<Self, ResultError> {
        Self::from_persisted(
            raw.name,
            raw.correct_count,
            raw.total_count,
            raw.score,
            raw.points_per_question,
            raw.elapsed_seconds,
            raw.completed_at,
        )
    }
}

impl ExamResult {
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        correct_count: u32,
        total_count: u32,
        points_per_question: u32,
        elapsed_seconds: u64,
        completed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            name: name.into(),
            correct_count,
            total_count,
            score: correct_count * points_per_question,
            points_per_question,
            elapsed_seconds,
            completed_at,
        }
    }

    /// Rehydrate a result from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `ResultError` if the counts or the derived score do not
    /// align.
    pub fn from_persisted(
        name: String,
        correct_count: u32,
        total_count: u32,
        score: u32,
        points_per_question: u32,
        elapsed_seconds: u64,
        completed_at: DateTime<Utc>,
    ) -> Result<Self, ResultError> {
        if correct_count > total_count {
            return Err(ResultError::CountMismatch {
                correct: correct_count,
                total: total_count,
            });
        }
        let expected = correct_count * points_per_question;
        if score != expected {
            return Err(ResultError::ScoreMismatch { score, expected });
        }

        Ok(Self {
            name,
            correct_count,
            total_count,
            score,
            points_per_question,
            elapsed_seconds,
            completed_at,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn total_count(&self) -> u32 {
        self.total_count
    }

    #[must_use]
    pub fn incorrect_count(&self) -> u32 {
        self.total_count.saturating_sub(self.correct_count)
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Scoring constant the score was derived with.
    #[must_use]
    pub fn points_per_question(&self) -> u32 {
        self.points_per_question
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    /// Elapsed time formatted `m:ss` the way the result table shows it.
    #[must_use]
    pub fn elapsed_display(&self) -> String {
        let minutes = self.elapsed_seconds / 60;
        let seconds = self.elapsed_seconds % 60;
        format!("{minutes}:{seconds:02}")
    }
}
