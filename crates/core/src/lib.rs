#![forbid(unsafe_code)]

//! Domain model for the exam engine: questions and categories, exam
//! variants and their budgets, attempt phases, scored results, and the
//! bounded usage history that biases sampling.

pub mod model;
pub mod ordering;
pub mod time;

pub use time::Clock;
