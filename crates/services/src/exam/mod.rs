//! Exam attempt lifecycle: the in-memory state machine, the countdown
//! driver that feeds it, and the orchestrating workflow service.

pub mod engine;
pub mod review;
pub mod timer;
pub mod workflow;

pub use engine::{ExamEngine, SubmitConfirm, SubmitOutcome, TickOutcome};
pub use review::{ReviewItem, Verdict};
pub use timer::Countdown;
pub use workflow::{ExamAttempt, ExamLoopService};
