use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::Category;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown exam variant: {raw}")]
pub struct ParseVariantError {
    raw: String,
}

/// Exam configuration bundle selected before a session starts.
///
/// A variant fixes the category set, the per-category sample size, the
/// time budget, and the scoring constant for one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamVariant {
    Preliminary,
    Heat,
}

impl ExamVariant {
    /// Countdown budget for one attempt, in seconds.
    #[must_use]
    pub fn time_budget_secs(self) -> u32 {
        match self {
            ExamVariant::Preliminary => 60 * 60,
            ExamVariant::Heat => 90 * 60,
        }
    }

    /// Points awarded per correct answer.
    #[must_use]
    pub fn points_per_question(self) -> u32 {
        4
    }

    /// Questions sampled from each category.
    #[must_use]
    pub fn per_category_count(self) -> usize {
        5
    }

    /// Categories included in this variant's paper.
    #[must_use]
    pub fn categories(self) -> Vec<Category> {
        Category::ALL.to_vec()
    }

    /// Directory segment of this variant in the question bank.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExamVariant::Preliminary => "preliminary",
            ExamVariant::Heat => "heat",
        }
    }
}

impl fmt::Display for ExamVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ExamVariant {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preliminary" => Ok(ExamVariant::Preliminary),
            "heat" => Ok(ExamVariant::Heat),
            other => Err(ParseVariantError {
                raw: other.to_owned(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budgets_differ_per_variant() {
        assert_eq!(ExamVariant::Preliminary.time_budget_secs(), 3600);
        assert_eq!(ExamVariant::Heat.time_budget_secs(), 5400);
    }

    #[test]
    fn scoring_constant_is_four() {
        assert_eq!(ExamVariant::Preliminary.points_per_question(), 4);
        assert_eq!(ExamVariant::Heat.points_per_question(), 4);
    }

    #[test]
    fn parses_bank_directory_names() {
        assert_eq!("heat".parse::<ExamVariant>().unwrap(), ExamVariant::Heat);
        assert!("regional".parse::<ExamVariant>().is_err());
    }
}
