use exam_core::model::{Question, QuestionId};

/// Per-question grading outcome shown during review.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Correct,
    Incorrect,
    /// No answer was recorded before submission.
    Unanswered,
    /// The bank supplied no answer key; never scored as correct.
    Ungraded,
}

/// Read-only projection of one scored question.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewItem {
    pub question_id: QuestionId,
    pub verdict: Verdict,
    /// What the participant entered, possibly empty.
    pub chosen: String,
    /// The expected key, absent for ungraded questions.
    pub correct_key: Option<String>,
}

impl ReviewItem {
    pub(crate) fn from_question(question: &Question) -> Self {
        let verdict = match &question.answer {
            None => Verdict::Ungraded,
            Some(_) if question.is_unanswered() => Verdict::Unanswered,
            Some(_) if question.is_correct() => Verdict::Correct,
            Some(_) => Verdict::Incorrect,
        };

        Self {
            question_id: question.id.clone(),
            verdict,
            chosen: question.user_answer.clone(),
            correct_key: question.answer.as_ref().map(|k| k.key.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{Category, Stem};

    fn free_text(id: &str) -> Question {
        Question::new(id, Category::NumberTheory, Stem::new("sum?"))
    }

    #[test]
    fn ungraded_wins_over_unanswered() {
        let item = ReviewItem::from_question(&free_text("q1"));
        assert_eq!(item.verdict, Verdict::Ungraded);
        assert!(item.correct_key.is_none());
    }

    #[test]
    fn graded_free_text_uses_exact_match() {
        let mut q = free_text("q2").with_answer("42");
        q.user_answer = "42".into();
        assert_eq!(ReviewItem::from_question(&q).verdict, Verdict::Correct);

        q.user_answer = " 42".into();
        assert_eq!(ReviewItem::from_question(&q).verdict, Verdict::Incorrect);

        q.user_answer.clear();
        assert_eq!(ReviewItem::from_question(&q).verdict, Verdict::Unanswered);
    }
}
