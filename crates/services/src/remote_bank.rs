use async_trait::async_trait;
use std::time::Duration;
use url::Url;

use exam_core::model::{Category, ExamVariant, Question};
use storage::repository::{QuestionBank, StorageError};

/// Question bank served over HTTP, one JSON array per
/// `<base>/<variant>/<category>.json`.
#[derive(Debug, Clone)]
pub struct HttpBank {
    client: reqwest::Client,
    base: Url,
}

impl HttpBank {
    /// Build a bank against a base URL such as
    /// `https://example.org/database/`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` for an invalid base URL or an
    /// unbuildable client.
    pub fn new(base: &str) -> Result<Self, StorageError> {
        let base = Url::parse(base).map_err(|e| StorageError::Connection(e.to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(Self { client, base })
    }

    fn collection_url(
        &self,
        variant: ExamVariant,
        category: Category,
    ) -> Result<Url, StorageError> {
        self.base
            .join(&format!("{}/{}.json", variant.as_str(), category.as_str()))
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl QuestionBank for HttpBank {
    async fn fetch(
        &self,
        variant: ExamVariant,
        category: Category,
    ) -> Result<Vec<Question>, StorageError> {
        let url = self.collection_url(variant, category)?;
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| StorageError::Fetch {
                variant,
                category,
                detail: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(StorageError::Fetch {
                variant,
                category,
                detail: format!("{url}: status {}", response.status()),
            });
        }

        let raw = response.text().await.map_err(|e| StorageError::Fetch {
            variant,
            category,
            detail: e.to_string(),
        })?;

        serde_json::from_str(&raw)
            .map_err(|e| StorageError::MalformedData(format!("{url}: {e}")))
    }
}
