#![forbid(unsafe_code)]

pub mod fs_bank;
pub mod repository;
pub mod sqlite;

pub use fs_bank::FsBank;
pub use repository::{KvStore, MemoryBank, MemoryKv, QuestionBank, StorageError};
pub use sqlite::{SqliteInitError, SqliteKv};
