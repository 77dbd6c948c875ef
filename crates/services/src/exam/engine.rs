use chrono::{DateTime, Utc};
use std::fmt;

use exam_core::Clock;
use exam_core::model::{ExamPhase, ExamResult, ExamVariant, Question};

use crate::error::ExamError;
use crate::exam::review::ReviewItem;

/// Host-supplied decision point for submitting with unanswered questions.
///
/// The engine blocks on this call; declining returns the session to
/// answering with the countdown untouched. The forced submit at
/// time-zero never consults it.
pub trait SubmitConfirm: Send + Sync {
    fn confirm_submit_with_unanswered(&self, unanswered: usize) -> bool;
}

/// Outcome of one countdown tick.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Still answering; the countdown moved down one second.
    Counting { seconds_remaining: u32 },
    /// The budget ran out and the attempt was scored without confirmation.
    AutoSubmitted(ExamResult),
    /// The attempt is no longer answering; the tick did nothing.
    Idle,
}

/// Outcome of a manual submission attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Submitted(ExamResult),
    /// The host declined the unanswered-questions confirmation.
    Declined,
    /// A result already exists; nothing was recomputed.
    AlreadyFinished,
}

/// State machine for one exam attempt.
///
/// Owns the assembled questions, the current-question pointer, the
/// countdown value, and the phase. All operations are in-memory
/// transitions; only construction can fail. At most one [`ExamResult`]
/// is ever produced per engine.
pub struct ExamEngine {
    name: String,
    variant: ExamVariant,
    questions: Vec<Question>,
    current: usize,
    seconds_remaining: u32,
    phase: ExamPhase,
    started_at: DateTime<Utc>,
    result: Option<ExamResult>,
    clock: Clock,
}

impl ExamEngine {
    /// Start an attempt over an assembled question set.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Empty` if no questions were assembled.
    pub fn new(
        name: impl Into<String>,
        variant: ExamVariant,
        questions: Vec<Question>,
        clock: Clock,
    ) -> Result<Self, ExamError> {
        if questions.is_empty() {
            return Err(ExamError::Empty);
        }

        Ok(Self {
            name: name.into(),
            variant,
            questions,
            current: 0,
            seconds_remaining: variant.time_budget_secs(),
            phase: ExamPhase::Answering,
            started_at: clock.now(),
            result: None,
            clock,
        })
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn variant(&self) -> ExamVariant {
        self.variant
    }

    #[must_use]
    pub fn phase(&self) -> ExamPhase {
        self.phase
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.current]
    }

    /// The scored summary, once a submission happened.
    #[must_use]
    pub fn result(&self) -> Option<&ExamResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn unanswered_count(&self) -> usize {
        self.questions.iter().filter(|q| q.is_unanswered()).count()
    }

    /// Record an answer for the current question. Last write wins; the
    /// score is untouched until submission. Inert outside answering.
    pub fn set_answer(&mut self, answer: impl Into<String>) {
        if self.phase.is_answering() {
            self.questions[self.current].user_answer = answer.into();
        }
    }

    /// Move to the next question; a no-op at the end.
    pub fn next(&mut self) {
        if self.phase.is_answering() && self.current + 1 < self.questions.len() {
            self.current += 1;
        }
    }

    /// Move to the previous question; a no-op at the start.
    pub fn previous(&mut self) {
        if self.phase.is_answering() && self.current > 0 {
            self.current -= 1;
        }
    }

    /// Advance the countdown by one second.
    ///
    /// At zero the attempt is scored immediately, exactly once, without
    /// the unanswered-questions confirmation. Outside the answering
    /// phase ticks do nothing, so no tick can act after submission or
    /// disposal.
    pub fn tick(&mut self) -> TickOutcome {
        if !self.phase.is_answering() {
            return TickOutcome::Idle;
        }

        self.seconds_remaining = self.seconds_remaining.saturating_sub(1);
        if self.seconds_remaining == 0 {
            tracing::info!(name = %self.name, "time expired, auto-submitting");
            return TickOutcome::AutoSubmitted(self.finalize());
        }

        TickOutcome::Counting {
            seconds_remaining: self.seconds_remaining,
        }
    }

    /// Manual submission.
    ///
    /// With unanswered questions present, the injected confirmation
    /// decides; declining leaves the attempt answering with the
    /// countdown unchanged.
    pub fn submit(&mut self, confirm: &dyn SubmitConfirm) -> SubmitOutcome {
        if !self.phase.is_answering() {
            return SubmitOutcome::AlreadyFinished;
        }

        let unanswered = self.unanswered_count();
        if unanswered > 0 && !confirm.confirm_submit_with_unanswered(unanswered) {
            return SubmitOutcome::Declined;
        }

        SubmitOutcome::Submitted(self.finalize())
    }

    /// Score the attempt and move to `Finished`. Guarded so a result is
    /// only ever computed once.
    fn finalize(&mut self) -> ExamResult {
        if let Some(result) = &self.result {
            return result.clone();
        }

        let correct = self.questions.iter().filter(|q| q.is_correct()).count();
        let total = self.questions.len();
        let now = self.clock.now();
        // elapsed comes from the wall clock, not the countdown
        let elapsed = (now - self.started_at).num_seconds().max(0);

        let result = ExamResult::new(
            self.name.clone(),
            u32::try_from(correct).unwrap_or(u32::MAX),
            u32::try_from(total).unwrap_or(u32::MAX),
            self.variant.points_per_question(),
            u64::try_from(elapsed).unwrap_or(0),
            now,
        );

        tracing::info!(
            name = %self.name,
            correct,
            total,
            score = result.score(),
            "attempt scored"
        );

        self.phase = ExamPhase::Finished;
        self.result = Some(result.clone());
        result
    }

    /// Switch from the result view to review. No-op unless finished.
    pub fn enter_review(&mut self) {
        if self.phase == ExamPhase::Finished {
            self.phase = ExamPhase::Reviewing;
        }
    }

    /// Switch back from review to the result view. No-op unless reviewing.
    pub fn exit_review(&mut self) {
        if self.phase == ExamPhase::Reviewing {
            self.phase = ExamPhase::Finished;
        }
    }

    /// Read-only projection of the scored attempt, one item per question.
    /// Empty before submission.
    #[must_use]
    pub fn review(&self) -> Vec<ReviewItem> {
        if !self.phase.is_scored() {
            return Vec::new();
        }
        self.questions.iter().map(ReviewItem::from_question).collect()
    }
}

impl fmt::Debug for ExamEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamEngine")
            .field("name", &self.name)
            .field("variant", &self.variant)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("seconds_remaining", &self.seconds_remaining)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exam::review::Verdict;
    use exam_core::model::{Category, Choice, Stem};
    use exam_core::time::fixed_clock;

    struct Always(bool);

    impl SubmitConfirm for Always {
        fn confirm_submit_with_unanswered(&self, _unanswered: usize) -> bool {
            self.0
        }
    }

    struct NeverAsked;

    impl SubmitConfirm for NeverAsked {
        fn confirm_submit_with_unanswered(&self, _unanswered: usize) -> bool {
            panic!("confirmation must not be consulted");
        }
    }

    fn question(id: &str, key: &str) -> Question {
        Question::new(id, Category::Arithmetic, Stem::new("?"))
            .with_choices(vec![Choice::new("A", "1"), Choice::new("B", "2")])
            .with_answer(key)
    }

    fn engine(count: usize) -> ExamEngine {
        let questions = (0..count).map(|i| question(&format!("q{i}"), "B")).collect();
        ExamEngine::new("Minh", ExamVariant::Preliminary, questions, fixed_clock()).unwrap()
    }

    #[test]
    fn empty_question_set_is_rejected() {
        let err =
            ExamEngine::new("Minh", ExamVariant::Preliminary, Vec::new(), fixed_clock())
                .unwrap_err();
        assert!(matches!(err, ExamError::Empty));
    }

    #[test]
    fn starts_answering_with_variant_budget() {
        let e = engine(3);
        assert_eq!(e.phase(), ExamPhase::Answering);
        assert_eq!(e.current_index(), 0);
        assert_eq!(e.seconds_remaining(), 3600);
    }

    #[test]
    fn navigation_clamps_at_both_ends() {
        let mut e = engine(2);
        e.previous();
        assert_eq!(e.current_index(), 0);
        e.next();
        e.next();
        e.next();
        assert_eq!(e.current_index(), 1);
        e.previous();
        assert_eq!(e.current_index(), 0);
    }

    #[test]
    fn set_answer_targets_current_question_last_write_wins() {
        let mut e = engine(2);
        e.set_answer("A");
        e.set_answer("B");
        e.next();
        e.set_answer("A");

        assert_eq!(e.questions()[0].user_answer, "B");
        assert_eq!(e.questions()[1].user_answer, "A");
        assert_eq!(e.unanswered_count(), 0);
    }

    #[test]
    fn scoring_is_exact_string_identity() {
        let mut e = engine(2);
        e.set_answer("B");
        e.next();
        e.set_answer("b"); // case mismatch, not correct

        let outcome = e.submit(&Always(true));
        let SubmitOutcome::Submitted(result) = outcome else {
            panic!("expected submission");
        };
        assert_eq!(result.correct_count(), 1);
        assert_eq!(result.total_count(), 2);
        assert_eq!(result.score(), 4);
    }

    #[test]
    fn all_correct_scores_per_question_points() {
        let mut e = engine(5);
        for _ in 0..5 {
            e.set_answer("B");
            e.next();
        }

        let SubmitOutcome::Submitted(result) = e.submit(&NeverAsked) else {
            panic!("expected submission");
        };
        assert_eq!(result.correct_count(), 5);
        assert_eq!(result.total_count(), 5);
        assert_eq!(result.score(), 20);
    }

    #[test]
    fn declined_confirmation_keeps_answering() {
        let mut e = engine(10);
        for _ in 0..7 {
            e.set_answer("B");
            e.next();
        }
        let before = e.seconds_remaining();

        let outcome = e.submit(&Always(false));
        assert_eq!(outcome, SubmitOutcome::Declined);
        assert_eq!(e.phase(), ExamPhase::Answering);
        assert_eq!(e.seconds_remaining(), before);
        assert!(e.result().is_none());
    }

    #[test]
    fn submit_with_no_unanswered_skips_confirmation() {
        let mut e = engine(1);
        e.set_answer("B");
        assert!(matches!(e.submit(&NeverAsked), SubmitOutcome::Submitted(_)));
    }

    #[test]
    fn tick_counts_down_and_auto_submits_at_zero() {
        let mut e = engine(3);
        e.seconds_remaining = 2;

        assert_eq!(
            e.tick(),
            TickOutcome::Counting {
                seconds_remaining: 1
            }
        );
        // confirmation is structurally absent from the tick path even
        // with every question unanswered
        let outcome = e.tick();
        assert!(matches!(outcome, TickOutcome::AutoSubmitted(_)));
        assert_eq!(e.phase(), ExamPhase::Finished);
    }

    #[test]
    fn ticks_after_finish_are_idle() {
        let mut e = engine(1);
        e.set_answer("B");
        let _ = e.submit(&NeverAsked);

        assert_eq!(e.tick(), TickOutcome::Idle);
        assert_eq!(e.tick(), TickOutcome::Idle);
    }

    #[test]
    fn second_submit_returns_existing_result_unchanged() {
        let mut e = engine(1);
        e.set_answer("B");
        let SubmitOutcome::Submitted(first) = e.submit(&NeverAsked) else {
            panic!("expected submission");
        };

        assert_eq!(e.submit(&Always(true)), SubmitOutcome::AlreadyFinished);
        assert_eq!(e.result(), Some(&first));
    }

    #[test]
    fn review_toggles_both_ways_without_recomputation() {
        let mut e = engine(1);
        e.set_answer("B");
        let _ = e.submit(&NeverAsked);
        let scored = e.result().cloned();

        e.enter_review();
        assert_eq!(e.phase(), ExamPhase::Reviewing);
        e.exit_review();
        assert_eq!(e.phase(), ExamPhase::Finished);
        assert_eq!(e.result().cloned(), scored);
    }

    #[test]
    fn review_before_submission_is_empty_and_phase_unchanged() {
        let mut e = engine(1);
        e.enter_review();
        assert_eq!(e.phase(), ExamPhase::Answering);
        assert!(e.review().is_empty());
    }

    #[test]
    fn review_projects_verdicts_and_correct_keys() {
        let mut e = engine(3);
        e.set_answer("B"); // correct
        e.next();
        e.set_answer("A"); // wrong
        let _ = e.submit(&Always(true));

        let items = e.review();
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].verdict, Verdict::Correct);
        assert_eq!(items[1].verdict, Verdict::Incorrect);
        assert_eq!(items[1].correct_key.as_deref(), Some("B"));
        assert_eq!(items[2].verdict, Verdict::Unanswered);
    }

    #[test]
    fn answers_are_frozen_after_submission() {
        let mut e = engine(1);
        let _ = e.submit(&Always(true));
        e.set_answer("B");
        assert!(e.questions()[0].user_answer.is_empty());
    }
}
