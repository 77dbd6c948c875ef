#![forbid(unsafe_code)]

//! Application services for the exam engine: question sampling with
//! anti-repetition history, the attempt state machine and countdown,
//! and bounded result recording.

pub mod error;
pub mod exam;
pub mod remote_bank;
pub mod results;
pub mod sampler;
pub mod usage_history;

pub use error::{ExamError, SamplerError};
pub use exam::{ExamAttempt, ExamEngine, ExamLoopService, SubmitConfirm, SubmitOutcome};
pub use remote_bank::HttpBank;
pub use results::{KvResultRecorder, ResultRecorder};
pub use sampler::{SampleSpec, Sampler};
pub use usage_history::UsageHistoryStore;
