use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

use crate::model::QuestionId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question has an empty id")]
    EmptyId,

    #[error("question {id} has an empty stem")]
    EmptyStem { id: QuestionId },

    #[error("question {id} repeats choice id {choice}")]
    DuplicateChoice { id: QuestionId, choice: String },

    #[error("question {id} answer key {key} matches no choice")]
    DanglingAnswerKey { id: QuestionId, key: String },

    #[error("unknown category: {0}")]
    UnknownCategory(String),
}

/// Question subject area. Serialized kebab-case to match the bank's
/// per-category collection names (`logic-thinking.json` etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Arithmetic,
    Combinatorics,
    Geometry,
    LogicThinking,
    NumberTheory,
}

impl Category {
    /// All categories, in the order the bank lays them out.
    pub const ALL: [Category; 5] = [
        Category::Arithmetic,
        Category::Combinatorics,
        Category::Geometry,
        Category::LogicThinking,
        Category::NumberTheory,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Arithmetic => "arithmetic",
            Category::Combinatorics => "combinatorics",
            Category::Geometry => "geometry",
            Category::LogicThinking => "logic-thinking",
            Category::NumberTheory => "number-theory",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| QuestionError::UnknownCategory(s.to_owned()))
    }
}

/// Bilingual question body: the primary text is required, the secondary
/// translation is optional and only surfaced when the host enables it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stem {
    pub en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vi: Option<String>,
}

impl Stem {
    #[must_use]
    pub fn new(en: impl Into<String>) -> Self {
        Self {
            en: en.into(),
            vi: None,
        }
    }

    #[must_use]
    pub fn with_secondary(mut self, vi: impl Into<String>) -> Self {
        self.vi = Some(vi.into());
        self
    }
}

/// One selectable answer. `id` is the key the participant picks ("A".."E")
/// and must be unique within the question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub en: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vi: Option<String>,
}

impl Choice {
    #[must_use]
    pub fn new(id: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            en: en.into(),
            vi: None,
        }
    }
}

/// Expected answer. For multiple choice this is a choice id; for free-text
/// questions it is the expected literal value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerKey {
    pub key: String,
}

impl AnswerKey {
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

/// A single exam question as served by the question bank.
///
/// `figure` is an opaque descriptor consumed by the rendering collaborator;
/// the engine carries it through untouched. `user_answer` is session-local
/// state and is never serialized back to the bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    #[serde(rename = "type")]
    pub category: Category,
    pub stem: Stem,
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<AnswerKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub figure: Option<serde_json::Value>,
    #[serde(skip)]
    pub user_answer: String,
}

impl Question {
    #[must_use]
    pub fn new(id: impl Into<QuestionId>, category: Category, stem: Stem) -> Self {
        Self {
            id: id.into(),
            category,
            stem,
            choices: Vec::new(),
            answer: None,
            figure: None,
            user_answer: String::new(),
        }
    }

    #[must_use]
    pub fn with_choices(mut self, choices: Vec<Choice>) -> Self {
        self.choices = choices;
        self
    }

    #[must_use]
    pub fn with_answer(mut self, key: impl Into<String>) -> Self {
        self.answer = Some(AnswerKey::new(key));
        self
    }

    /// True when the question offers no choices and expects typed input.
    #[must_use]
    pub fn is_free_text(&self) -> bool {
        self.choices.is_empty()
    }

    /// True when the participant has not recorded an answer yet.
    #[must_use]
    pub fn is_unanswered(&self) -> bool {
        self.user_answer.is_empty()
    }

    /// True iff the recorded answer equals the key exactly. Ungraded
    /// questions (no key) are never correct.
    #[must_use]
    pub fn is_correct(&self) -> bool {
        match &self.answer {
            Some(key) => key.key == self.user_answer,
            None => false,
        }
    }

    /// Check well-formedness of a bank-supplied question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` for an empty id or stem, repeated choice
    /// ids, or an answer key that matches no choice on a multiple-choice
    /// question.
    pub fn validate(&self) -> Result<(), QuestionError> {
        if self.id.is_empty() {
            return Err(QuestionError::EmptyId);
        }
        if self.stem.en.trim().is_empty() {
            return Err(QuestionError::EmptyStem {
                id: self.id.clone(),
            });
        }

        let mut seen = HashSet::new();
        for choice in &self.choices {
            if !seen.insert(choice.id.as_str()) {
                return Err(QuestionError::DuplicateChoice {
                    id: self.id.clone(),
                    choice: choice.id.clone(),
                });
            }
        }

        if let Some(answer) = &self.answer
            && !self.choices.is_empty()
            && !self.choices.iter().any(|c| c.id == answer.key)
        {
            return Err(QuestionError::DanglingAnswerKey {
                id: self.id.clone(),
                key: answer.key.clone(),
            });
        }

        Ok(())
    }
}
