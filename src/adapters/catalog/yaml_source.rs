//! YAML file category source.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::category::{CatalogError, CategoryConfigSet};
use crate::ports::CategorySource;

/// Reads the category document from a YAML file on every `load`.
#[derive(Debug, Clone)]
pub struct YamlCategorySource {
    path: PathBuf,
}

impl YamlCategorySource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CategorySource for YamlCategorySource {
    async fn load(&self) -> Result<CategoryConfigSet, CatalogError> {
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| CatalogError::io(self.path.display().to_string(), e.to_string()))?;
        CategoryConfigSet::from_yaml_str(&content)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const VALID: &str = r#"
version: "1"
categories:
  family_law:
    name: Family Law
    keywords: [divorce]
    fields:
      first_name: { type: text, required: true, source: user_provided }
    conversation_order:
      - { order: 1, field: first_name }
    marketplace: { campaign_id: C, supplier_id: S, key: K }
"#;

    async fn write(dir: &TempDir, content: &str) -> PathBuf {
        let path = dir.path().join("categories.yaml");
        fs::write(&path, content).await.unwrap();
        path
    }

    #[tokio::test]
    async fn loads_valid_document() {
        let dir = TempDir::new().unwrap();
        let source = YamlCategorySource::new(write(&dir, VALID).await);

        let set = source.load().await.unwrap();
        assert_eq!(set.version.as_deref(), Some("1"));
        assert_eq!(set.get("family_law").unwrap().key, "family_law");
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let source = YamlCategorySource::new(dir.path().join("absent.yaml"));

        let err = source.load().await.unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
        assert!(source.describe().ends_with("absent.yaml"));
    }

    #[tokio::test]
    async fn structural_violation_fails_load() {
        let dir = TempDir::new().unwrap();
        let broken = VALID.replace("field: first_name", "field: middle_name");
        let source = YamlCategorySource::new(write(&dir, &broken).await);

        let err = source.load().await.unwrap_err();
        assert_eq!(err.violations().len(), 1);
        assert!(err.violations()[0].contains("middle_name"));
    }

    #[tokio::test]
    async fn shipped_catalog_is_valid() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("catalog/categories.yaml");
        let set = YamlCategorySource::new(path).load().await.unwrap();
        for key in ["personal_injury", "family_law", "criminal_defense"] {
            assert!(set.contains(key), "missing {key}");
        }
    }
}
