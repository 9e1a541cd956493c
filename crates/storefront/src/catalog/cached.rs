//! Schema cache in front of a catalog.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use pideai_core::{GroupId, Modifier, ModifierGroup, Product, ProductId, ProductSchema};
use tracing::debug;

use super::{Catalog, CatalogError};

/// Caches assembled product schemas for 5 minutes.
///
/// Only [`Catalog::product_schema`] is cached; the granular lookups pass
/// straight through. Unknown products are not cached.
#[derive(Clone)]
pub struct CachedCatalog {
    inner: Arc<dyn Catalog>,
    cache: Cache<ProductId, ProductSchema>,
}

impl CachedCatalog {
    #[must_use]
    pub fn new(inner: Arc<dyn Catalog>) -> Self {
        Self::with_ttl(inner, Duration::from_secs(300))
    }

    #[must_use]
    pub fn with_ttl(inner: Arc<dyn Catalog>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(ttl)
            .build();
        Self { inner, cache }
    }

    /// Drop every cached schema.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

#[async_trait]
impl Catalog for CachedCatalog {
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, CatalogError> {
        self.inner.get_product(id).await
    }

    async fn get_modifier_groups(&self, id: &ProductId) -> Result<Vec<ModifierGroup>, CatalogError> {
        self.inner.get_modifier_groups(id).await
    }

    async fn get_modifiers(&self, group_id: &GroupId) -> Result<Vec<Modifier>, CatalogError> {
        self.inner.get_modifiers(group_id).await
    }

    async fn get_ungrouped_modifiers(&self, id: &ProductId) -> Result<Vec<Modifier>, CatalogError> {
        self.inner.get_ungrouped_modifiers(id).await
    }

    async fn product_schema(&self, id: &ProductId) -> Result<Option<ProductSchema>, CatalogError> {
        if let Some(schema) = self.cache.get(id).await {
            debug!(product_id = %id, "Cache hit for product schema");
            return Ok(Some(schema));
        }

        let schema = self.inner.product_schema(id).await?;
        if let Some(schema) = &schema {
            self.cache.insert(id.clone(), schema.clone()).await;
        }
        Ok(schema)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pideai_core::Price;

    use super::*;

    #[derive(Default)]
    struct CountingCatalog {
        product_lookups: AtomicUsize,
    }

    #[async_trait]
    impl Catalog for CountingCatalog {
        async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, CatalogError> {
            self.product_lookups.fetch_add(1, Ordering::SeqCst);
            if id.as_str() != "p1" {
                return Ok(None);
            }
            Ok(Some(Product {
                id: id.clone(),
                name: "Pizza".to_string(),
                base_price: Price::from_cents(1000).unwrap(),
                image_ref: None,
            }))
        }

        async fn get_modifier_groups(&self, _: &ProductId) -> Result<Vec<ModifierGroup>, CatalogError> {
            Ok(Vec::new())
        }

        async fn get_modifiers(&self, _: &GroupId) -> Result<Vec<Modifier>, CatalogError> {
            Ok(Vec::new())
        }

        async fn get_ungrouped_modifiers(&self, _: &ProductId) -> Result<Vec<Modifier>, CatalogError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_schema_is_cached() {
        let inner = Arc::new(CountingCatalog::default());
        let catalog = CachedCatalog::new(inner.clone());
        let id = ProductId::new("p1").unwrap();

        assert!(catalog.product_schema(&id).await.unwrap().is_some());
        assert!(catalog.product_schema(&id).await.unwrap().is_some());
        assert_eq!(inner.product_lookups.load(Ordering::SeqCst), 1);

        catalog.invalidate_all();
        assert!(catalog.product_schema(&id).await.unwrap().is_some());
        assert_eq!(inner.product_lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_missing_product_is_not_cached() {
        let inner = Arc::new(CountingCatalog::default());
        let catalog = CachedCatalog::new(inner.clone());
        let id = ProductId::new("nope").unwrap();

        assert!(catalog.product_schema(&id).await.unwrap().is_none());
        assert!(catalog.product_schema(&id).await.unwrap().is_none());
        assert_eq!(inner.product_lookups.load(Ordering::SeqCst), 2);
    }
}
