//! In-memory category source, for tests and embedded configurations.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::domain::category::{CatalogError, CategoryConfigSet};
use crate::ports::CategorySource;

/// Serves a fixed, already-validated document and counts loads.
#[derive(Debug, Clone)]
pub struct InMemoryCategorySource {
    set: CategoryConfigSet,
    loads: Arc<AtomicUsize>,
}

impl InMemoryCategorySource {
    pub fn new(set: CategoryConfigSet) -> Self {
        Self {
            set,
            loads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Parses and validates a YAML document up front.
    pub fn from_yaml(yaml: &str) -> Result<Self, CatalogError> {
        Ok(Self::new(CategoryConfigSet::from_yaml_str(yaml)?))
    }

    /// Number of times `load` has been called.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CategorySource for InMemoryCategorySource {
    async fn load(&self) -> Result<CategoryConfigSet, CatalogError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(self.set.clone())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counts_loads() {
        let source = InMemoryCategorySource::from_yaml(
            r#"
categories:
  family_law:
    name: Family Law
    fields:
      first_name: { type: text, required: true, source: user_provided }
    marketplace: { campaign_id: C, supplier_id: S, key: K }
"#,
        )
        .unwrap();

        source.load().await.unwrap();
        source.load().await.unwrap();
        assert_eq!(source.load_count(), 2);
    }

    #[test]
    fn invalid_yaml_rejected_up_front() {
        assert!(InMemoryCategorySource::from_yaml("categories: {}").is_err());
    }
}
