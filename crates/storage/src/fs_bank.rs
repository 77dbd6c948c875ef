use async_trait::async_trait;
use exam_core::model::{Category, ExamVariant, Question};
use std::path::{Path, PathBuf};

use crate::repository::{QuestionBank, StorageError};

/// Question bank over a local directory laid out as
/// `<root>/<variant>/<category>.json`, each file holding one JSON array
/// of questions.
#[derive(Debug, Clone)]
pub struct FsBank {
    root: PathBuf,
}

impl FsBank {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collection_path(&self, variant: ExamVariant, category: Category) -> PathBuf {
        self.root
            .join(variant.as_str())
            .join(format!("{}.json", category.as_str()))
    }
}

#[async_trait]
impl QuestionBank for FsBank {
    async fn fetch(
        &self,
        variant: ExamVariant,
        category: Category,
    ) -> Result<Vec<Question>, StorageError> {
        let path = self.collection_path(variant, category);
        let raw = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| StorageError::Fetch {
                variant,
                category,
                detail: format!("{}: {e}", path.display()),
            })?;

        serde_json::from_str(&raw)
            .map_err(|e| StorageError::MalformedData(format!("{}: {e}", path.display())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_bank(dir: &Path, variant: &str, category: &str, body: &str) {
        let sub = dir.join(variant);
        std::fs::create_dir_all(&sub).unwrap();
        std::fs::write(sub.join(format!("{category}.json")), body).unwrap();
    }

    #[tokio::test]
    async fn reads_collection_from_layout() {
        let dir = tempfile::tempdir().unwrap();
        write_bank(
            dir.path(),
            "preliminary",
            "arithmetic",
            r#"[{
                "id": "a1",
                "type": "arithmetic",
                "stem": { "en": "1 + 1 = ?" },
                "choices": [{ "id": "A", "en": "2" }],
                "answer": { "key": "A" }
            }]"#,
        );

        let bank = FsBank::new(dir.path());
        let questions = bank
            .fetch(ExamVariant::Preliminary, Category::Arithmetic)
            .await
            .unwrap();
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].id.as_str(), "a1");
    }

    #[tokio::test]
    async fn missing_file_is_a_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let bank = FsBank::new(dir.path());
        let err = bank
            .fetch(ExamVariant::Heat, Category::Geometry)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Fetch { .. }));
    }

    #[tokio::test]
    async fn invalid_json_is_malformed_data() {
        let dir = tempfile::tempdir().unwrap();
        write_bank(dir.path(), "preliminary", "geometry", "{ not json ]");

        let bank = FsBank::new(dir.path());
        let err = bank
            .fetch(ExamVariant::Preliminary, Category::Geometry)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::MalformedData(_)));
    }
}
