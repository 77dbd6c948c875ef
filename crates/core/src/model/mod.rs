mod history;
mod ids;
mod phase;
mod question;
mod result;
mod variant;

pub use history::{USAGE_HISTORY_CAP, UsageHistory};
pub use ids::QuestionId;
pub use phase::ExamPhase;
pub use question::{AnswerKey, Category, Choice, Question, QuestionError, Stem};
pub use result::{ExamResult, ResultError};
pub use variant::{ExamVariant, ParseVariantError};
