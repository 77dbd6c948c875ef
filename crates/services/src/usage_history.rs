use std::sync::Arc;

use exam_core::model::{QuestionId, UsageHistory};
use storage::repository::{KvStore, StorageError};

/// Storage key for the recently-served-question record.
pub const USAGE_HISTORY_KEY: &str = "exam.used-questions";

/// Persistence glue for [`UsageHistory`] over the key-value port.
///
/// History only biases sampling, so a missing or unreadable stored value
/// degrades to an empty history instead of failing the assembly.
#[derive(Clone)]
pub struct UsageHistoryStore {
    kv: Arc<dyn KvStore>,
}

impl UsageHistoryStore {
    #[must_use]
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Load the stored history, treating absent or corrupt data as empty.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` only when the backend itself fails.
    pub async fn load(&self) -> Result<UsageHistory, StorageError> {
        let Some(raw) = self.kv.get(USAGE_HISTORY_KEY).await? else {
            return Ok(UsageHistory::new());
        };

        match serde_json::from_str(&raw) {
            Ok(history) => Ok(history),
            Err(e) => {
                tracing::warn!(error = %e, "discarding unreadable usage history");
                Ok(UsageHistory::new())
            }
        }
    }

    /// Push one assembly's ids onto the stored history and persist it.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if loading or writing the record fails.
    pub async fn record(&self, ids: Vec<QuestionId>) -> Result<UsageHistory, StorageError> {
        let mut history = self.load().await?;
        history.push_recent(ids);

        let raw = serde_json::to_string(&history)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.kv.set(USAGE_HISTORY_KEY, &raw).await?;
        Ok(history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::USAGE_HISTORY_CAP;
    use storage::repository::MemoryKv;

    fn ids(raw: &[&str]) -> Vec<QuestionId> {
        raw.iter().map(|s| QuestionId::new(*s)).collect()
    }

    #[tokio::test]
    async fn missing_value_loads_as_empty() {
        let store = UsageHistoryStore::new(Arc::new(MemoryKv::new()));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_value_loads_as_empty() {
        let kv = Arc::new(MemoryKv::new());
        kv.set(USAGE_HISTORY_KEY, "{ broken").await.unwrap();

        let store = UsageHistoryStore::new(kv);
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn record_persists_most_recent_first() {
        let kv = Arc::new(MemoryKv::new());
        let store = UsageHistoryStore::new(kv);

        store.record(ids(&["q1"])).await.unwrap();
        store.record(ids(&["q2"])).await.unwrap();

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.entries().next().unwrap(), ids(&["q2"]).as_slice());
    }

    #[tokio::test]
    async fn fifteen_assemblies_keep_exactly_ten() {
        let store = UsageHistoryStore::new(Arc::new(MemoryKv::new()));
        for i in 0..15 {
            store.record(ids(&[&format!("q{i}")])).await.unwrap();
        }

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), USAGE_HISTORY_CAP);
        assert_eq!(
            loaded.entries().next().unwrap(),
            ids(&["q14"]).as_slice()
        );
    }
}
