use async_trait::async_trait;
use exam_core::model::{Category, ExamVariant, Question};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    /// A category's collection could not be retrieved. Fatal to the
    /// assembly that requested it.
    #[error("fetch failed for {variant}/{category}: {detail}")]
    Fetch {
        variant: ExamVariant,
        category: Category,
        detail: String,
    },

    /// A fetched collection is not a well-formed sequence of questions.
    #[error("malformed question data: {0}")]
    MalformedData(String),
}

/// Key-value persistence port backing usage history and result history.
///
/// Values are opaque strings; callers serialize with serde. Injected at
/// construction so the sampler and recorder are testable without a real
/// backend.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch the value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the value stored under `key`; absent keys are a no-op.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the delete fails.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;
}

/// Source of raw question collections, one per variant and category.
///
/// Collections are returned unmodified; sampling, shuffling, and answer
/// resets happen downstream.
#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// Fetch the raw collection for one category of a variant.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Fetch` when the collection cannot be
    /// retrieved and `StorageError::MalformedData` when it does not
    /// decode into questions.
    async fn fetch(
        &self,
        variant: ExamVariant,
        category: Category,
    ) -> Result<Vec<Question>, StorageError>;
}

/// In-memory key-value store for tests and ephemeral runs.
#[derive(Clone, Default)]
pub struct MemoryKv {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryKv {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let mut guard = self
            .entries
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(key);
        Ok(())
    }
}

/// In-memory question bank for tests and prototyping.
#[derive(Clone, Default)]
pub struct MemoryBank {
    collections: Arc<Mutex<HashMap<(ExamVariant, Category), Vec<Question>>>>,
}

impl MemoryBank {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the collection served for `variant`/`category`.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned; acceptable in the test
    /// contexts this bank is built for.
    pub fn put(&self, variant: ExamVariant, category: Category, questions: Vec<Question>) {
        self.collections
            .lock()
            .expect("memory bank lock poisoned")
            .insert((variant, category), questions);
    }
}

#[async_trait]
impl QuestionBank for MemoryBank {
    async fn fetch(
        &self,
        variant: ExamVariant,
        category: Category,
    ) -> Result<Vec<Question>, StorageError> {
        let guard = self
            .collections
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .get(&(variant, category))
            .cloned()
            .ok_or(StorageError::Fetch {
                variant,
                category,
                detail: "no collection loaded".to_owned(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::Stem;

    #[tokio::test]
    async fn memory_kv_round_trips() {
        let kv = MemoryKv::new();
        assert!(kv.get("k").await.unwrap().is_none());

        kv.set("k", "v1").await.unwrap();
        kv.set("k", "v2").await.unwrap();
        assert_eq!(kv.get("k").await.unwrap().as_deref(), Some("v2"));

        kv.delete("k").await.unwrap();
        assert!(kv.get("k").await.unwrap().is_none());
        // deleting again is a no-op
        kv.delete("k").await.unwrap();
    }

    #[tokio::test]
    async fn memory_bank_misses_are_fetch_errors() {
        let bank = MemoryBank::new();
        let err = bank
            .fetch(ExamVariant::Preliminary, Category::Geometry)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Fetch { .. }));

        let q = Question::new("g1", Category::Geometry, Stem::new("area?"));
        bank.put(ExamVariant::Preliminary, Category::Geometry, vec![q]);
        let got = bank
            .fetch(ExamVariant::Preliminary, Category::Geometry)
            .await
            .unwrap();
        assert_eq!(got.len(), 1);
    }
}
