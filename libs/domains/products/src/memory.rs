//! In-memory implementation of ProductRepository
//!
//! Keeps products in id order, which matches the scan order of the MongoDB
//! store. Useful for local runs without a database and for tests.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::ops::Bound;
use tokio::sync::RwLock;
use tracing::instrument;

use crate::error::{ProductError, ProductResult};
use crate::models::{Product, ScanPage, WriteCondition};
use crate::repository::ProductRepository;

#[derive(Default)]
pub struct InMemoryProductRepository {
    products: RwLock<BTreeMap<String, Product>>,
}

impl InMemoryProductRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a repository pre-populated with products
    pub fn with_products(products: impl IntoIterator<Item = Product>) -> Self {
        let products = products.into_iter().map(|p| (p.id.clone(), p)).collect();
        Self {
            products: RwLock::new(products),
        }
    }

    pub async fn len(&self) -> usize {
        self.products.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.products.read().await.is_empty()
    }
}

#[async_trait]
impl ProductRepository for InMemoryProductRepository {
    #[instrument(skip(self))]
    async fn scan(&self, limit: usize, start_after: Option<String>) -> ProductResult<ScanPage> {
        let products = self.products.read().await;

        let lower = match start_after.as_ref() {
            Some(key) => Bound::Excluded(key),
            None => Bound::Unbounded,
        };
        let mut remaining = products.range::<String, _>((lower, Bound::Unbounded));

        let items: Vec<Product> = remaining.by_ref().take(limit).map(|(_, p)| p.clone()).collect();
        let next_key = if remaining.next().is_some() {
            items.last().map(|p| p.id.clone())
        } else {
            None
        };

        Ok(ScanPage { items, next_key })
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &str) -> ProductResult<Option<Product>> {
        Ok(self.products.read().await.get(id).cloned())
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn put(
        &self,
        product: &Product,
        condition: Option<WriteCondition>,
    ) -> ProductResult<()> {
        // Check and write under one write lock
        let mut products = self.products.write().await;

        if let Some(WriteCondition::LastModifiedEquals(expected)) = condition {
            let current = products.get(&product.id).map(|p| p.last_modified.as_str());
            if current != Some(expected.as_str()) {
                tracing::info!(product_id = %product.id, "Conditional write rejected");
                return Err(ProductError::ConditionFailed);
            }
        }

        products.insert(product.id.clone(), product.clone());
        Ok(())
    }
}
