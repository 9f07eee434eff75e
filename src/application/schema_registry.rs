//! Memoized per-category schemas.
//!
//! A compiled schema is tagged with the catalog generation it was built
//! from and rebuilt the first time it is requested after a reload.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use crate::domain::category::CatalogError;
use crate::domain::schema::{CategorySchema, FieldError, SchemaViolations};

use super::catalog::CategoryCatalog;

pub struct SchemaRegistry {
    catalog: Arc<CategoryCatalog>,
    schemas: RwLock<HashMap<String, (u64, Arc<CategorySchema>)>>,
}

impl SchemaRegistry {
    pub fn new(catalog: Arc<CategoryCatalog>) -> Self {
        Self {
            catalog,
            schemas: RwLock::new(HashMap::new()),
        }
    }

    /// Schema for `category`, or `None` if the category is not configured.
    pub async fn schema_for(
        &self,
        category: &str,
    ) -> Result<Option<Arc<CategorySchema>>, CatalogError> {
        let snapshot = self.catalog.snapshot().await?;

        {
            let schemas = self.schemas.read().unwrap_or_else(|e| e.into_inner());
            if let Some((generation, schema)) = schemas.get(category) {
                if *generation == snapshot.generation {
                    return Ok(Some(schema.clone()));
                }
            }
        }

        let Some(config) = snapshot.set.get(category) else {
            return Ok(None);
        };
        let schema = Arc::new(CategorySchema::compile(config));
        tracing::debug!(category, generation = snapshot.generation, "Compiled category schema");
        self.schemas
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(category.to_string(), (snapshot.generation, schema.clone()));
        Ok(Some(schema))
    }

    /// Validates one value. `Ok(None)` means the category is unknown.
    pub async fn validate_field(
        &self,
        category: &str,
        name: &str,
        value: &str,
    ) -> Result<Option<Result<String, FieldError>>, CatalogError> {
        Ok(self
            .schema_for(category)
            .await?
            .map(|schema| schema.validate_field(name, value)))
    }

    /// Validates a complete payload. `Ok(None)` means the category is unknown.
    pub async fn validate_submission(
        &self,
        category: &str,
        payload: &BTreeMap<String, String>,
    ) -> Result<Option<Result<BTreeMap<String, String>, SchemaViolations>>, CatalogError> {
        Ok(self
            .schema_for(category)
            .await?
            .map(|schema| schema.validate_submission(payload)))
    }

    /// Drops every compiled schema.
    pub fn clear(&self) {
        self.schemas
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
    }

    pub fn len(&self) -> usize {
        self.schemas.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
