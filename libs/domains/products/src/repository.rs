use async_trait::async_trait;

use crate::error::ProductResult;
use crate::models::{Product, ScanPage, WriteCondition};

/// Repository trait for Product persistence
///
/// The store is a plain key/value table: products are addressed by `id`,
/// listed by scanning, and written whole. Implementations must evaluate a
/// [`WriteCondition`] atomically with the write and report a failed condition as
/// [`ProductError::ConditionFailed`](crate::error::ProductError::ConditionFailed).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Return up to `limit` products that follow `start_after` in store order
    async fn scan(&self, limit: usize, start_after: Option<String>) -> ProductResult<ScanPage>;

    /// Get a product by id
    async fn get(&self, id: &str) -> ProductResult<Option<Product>>;

    /// Write a product, replacing any stored version
    async fn put(&self, product: &Product, condition: Option<WriteCondition>)
        -> ProductResult<()>;
}
