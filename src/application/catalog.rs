//! Category catalog - the Config Loader's bounded-TTL cache.
//!
//! The first load must succeed; startup aborts otherwise. Afterwards an
//! expired entry is refreshed from the source on demand. A refresh that fails
//! keeps serving the last good document and logs the error.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::domain::category::{CatalogError, CategoryConfig, CategoryConfigSet};
use crate::ports::CategorySource;

/// A loaded document and the generation it was loaded as.
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    pub set: Arc<CategoryConfigSet>,
    /// Increases every time a new document is loaded.
    pub generation: u64,
}

#[derive(Debug)]
struct Cached {
    snapshot: CatalogSnapshot,
    loaded_at: Instant,
}

pub struct CategoryCatalog {
    source: Arc<dyn CategorySource>,
    ttl: Duration,
    cached: RwLock<Option<Cached>>,
    generation: AtomicU64,
}

impl CategoryCatalog {
    pub fn new(source: Arc<dyn CategorySource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            cached: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Current document, loading or refreshing it when the cache has expired.
    pub async fn snapshot(&self) -> Result<CatalogSnapshot, CatalogError> {
        {
            let cached = self.cached.read().await;
            if let Some(entry) = cached.as_ref() {
                if entry.loaded_at.elapsed() < self.ttl {
                    return Ok(entry.snapshot.clone());
                }
            }
        }

        match self.source.load().await {
            Ok(set) => {
                let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                let snapshot = CatalogSnapshot {
                    set: Arc::new(set),
                    generation,
                };
                tracing::info!(
                    source = %self.source.describe(),
                    generation,
                    categories = snapshot.set.len(),
                    "Loaded category configuration"
                );
                *self.cached.write().await = Some(Cached {
                    snapshot: snapshot.clone(),
                    loaded_at: Instant::now(),
                });
                Ok(snapshot)
            }
            Err(err) => {
                let mut cached = self.cached.write().await;
                match cached.as_mut() {
                    Some(entry) => {
                        tracing::error!(
                            source = %self.source.describe(),
                            error = %err,
                            "Category configuration refresh failed, serving previous version"
                        );
                        entry.loaded_at = Instant::now();
                        Ok(entry.snapshot.clone())
                    }
                    None => Err(err),
                }
            }
        }
    }

    /// The full document.
    pub async fn load(&self) -> Result<Arc<CategoryConfigSet>, CatalogError> {
        Ok(self.snapshot().await?.set)
    }

    /// One category by key.
    pub async fn get_category(&self, key: &str) -> Result<Option<CategoryConfig>, CatalogError> {
        Ok(self.load().await?.get(key).cloned())
    }

    /// Drops the cached document; the next access reloads it.
    pub async fn invalidate(&self) {
        *self.cached.write().await = None;
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }
}
