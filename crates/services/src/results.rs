use async_trait::async_trait;
use std::sync::Arc;

use exam_core::model::ExamResult;
use storage::repository::{KvStore, StorageError};

/// Storage key for the bounded result history.
pub const RESULT_HISTORY_KEY: &str = "exam.results";

/// Most recent results kept.
pub const RESULT_HISTORY_CAP: usize = 10;

/// Sink for finished attempts. The engine calls [`record`] exactly once
/// per successful submission and never inspects stored history itself.
///
/// [`record`]: ResultRecorder::record
#[async_trait]
pub trait ResultRecorder: Send + Sync {
    /// Append a finished result to the front of the history.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the history cannot be persisted.
    async fn record(&self, result: &ExamResult) -> Result<(), StorageError>;

    /// Stored results, most recent first, at most [`RESULT_HISTORY_CAP`].
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the history cannot be read.
    async fn list(&self) -> Result<Vec<ExamResult>, StorageError>;
}

/// Result history over the key-value port, stored as one JSON array.
#[derive(Clone)]
pub struct KvResultRecorder {
    kv: Arc<dyn KvStore>,
}

impl KvResultRecorder {
    #[must_use]
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    async fn load(&self) -> Result<Vec<ExamResult>, StorageError> {
        let Some(raw) = self.kv.get(RESULT_HISTORY_KEY).await? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&raw).map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

#[async_trait]
impl ResultRecorder for KvResultRecorder {
    async fn record(&self, result: &ExamResult) -> Result<(), StorageError> {
        let mut history = self.load().await?;
        history.insert(0, result.clone());
        history.truncate(RESULT_HISTORY_CAP);

        let raw = serde_json::to_string(&history)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.kv.set(RESULT_HISTORY_KEY, &raw).await
    }

    async fn list(&self) -> Result<Vec<ExamResult>, StorageError> {
        self.load().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::time::fixed_now;
    use storage::repository::MemoryKv;

    fn result(name: &str, correct: u32) -> ExamResult {
        ExamResult::new(name, correct, 25, 4, 600, fixed_now())
    }

    #[tokio::test]
    async fn empty_store_lists_nothing() {
        let recorder = KvResultRecorder::new(Arc::new(MemoryKv::new()));
        assert!(recorder.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn records_are_most_recent_first() {
        let recorder = KvResultRecorder::new(Arc::new(MemoryKv::new()));
        recorder.record(&result("first", 10)).await.unwrap();
        recorder.record(&result("second", 20)).await.unwrap();

        let listed = recorder.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name(), "second");
        assert_eq!(listed[1].name(), "first");
    }

    #[tokio::test]
    async fn history_is_capped() {
        let recorder = KvResultRecorder::new(Arc::new(MemoryKv::new()));
        for i in 0..12 {
            recorder.record(&result(&format!("run {i}"), i)).await.unwrap();
        }

        let listed = recorder.list().await.unwrap();
        assert_eq!(listed.len(), RESULT_HISTORY_CAP);
        assert_eq!(listed[0].name(), "run 11");
    }

    #[tokio::test]
    async fn tampered_stored_entry_is_rejected_on_load() {
        let kv = Arc::new(MemoryKv::new());
        let tampered = r#"[{
            "name": "Minh",
            "correct_count": 0,
            "total_count": 25,
            "score": 999,
            "points_per_question": 4,
            "elapsed_seconds": 10,
            "completed_at": "2024-01-15T08:20:00Z"
        }]"#;
        kv.set(RESULT_HISTORY_KEY, tampered).await.unwrap();

        let recorder = KvResultRecorder::new(kv);
        let err = recorder.list().await.unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
    }

    #[tokio::test]
    async fn survives_recorder_instances() {
        let kv: Arc<dyn KvStore> = Arc::new(MemoryKv::new());
        KvResultRecorder::new(Arc::clone(&kv))
            .record(&result("durable", 25))
            .await
            .unwrap();

        let listed = KvResultRecorder::new(kv).list().await.unwrap();
        assert_eq!(listed[0].name(), "durable");
        assert_eq!(listed[0].score(), 100);
    }
}
