//! Catalog listing cache.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use novashop_core::Product;

/// Product listings keyed by search query.
///
/// A zero TTL disables caching entirely, so every catalog read goes to the
/// backend.
#[derive(Clone)]
pub struct CatalogCache {
    listings: Option<Cache<String, Arc<Vec<Product>>>>,
}

impl CatalogCache {
    /// Cache at most this many distinct queries.
    const MAX_QUERIES: u64 = 500;

    pub fn new(ttl: Duration) -> Self {
        let listings = (!ttl.is_zero()).then(|| {
            Cache::builder()
                .max_capacity(Self::MAX_QUERIES)
                .time_to_live(ttl)
                .build()
        });
        Self { listings }
    }

    pub async fn get(&self, query: &str) -> Option<Arc<Vec<Product>>> {
        self.listings.as_ref()?.get(query).await
    }

    pub async fn insert(&self, query: &str, products: Arc<Vec<Product>>) {
        if let Some(listings) = &self.listings {
            listings.insert(query.to_owned(), products).await;
        }
    }
}
