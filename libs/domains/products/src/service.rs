//! Product Service - Business logic layer

use serde_json::Value;
use std::sync::Arc;
use tracing::instrument;

use crate::error::{ProductError, ProductResult};
use crate::ids::{IdGenerator, UuidIdGenerator};
use crate::models::{Product, ScanPage, WriteCondition, ID_FIELD, PAGE_SIZE};
use crate::patch::{apply_patch, parse_patch, PatchError};
use crate::repository::ProductRepository;
use crate::validation::{DefaultProductValidator, ProductValidator};

/// Product service providing business logic operations
///
/// Updates use optimistic concurrency: the product is read, patched and
/// validated without holding any lock, and the write only succeeds if the stored
/// `lastModified` is still the value that was read.
pub struct ProductService<R: ProductRepository> {
    repository: Arc<R>,
    validator: Arc<dyn ProductValidator>,
    ids: Arc<dyn IdGenerator>,
}

impl<R: ProductRepository> ProductService<R> {
    /// Create a new ProductService with the default validator and id source
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
            validator: Arc::new(DefaultProductValidator),
            ids: Arc::new(UuidIdGenerator),
        }
    }

    pub fn with_validator(mut self, validator: impl ProductValidator + 'static) -> Self {
        self.validator = Arc::new(validator);
        self
    }

    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.ids = Arc::new(ids);
        self
    }

    /// List one page of products, starting after `start_after`
    #[instrument(skip(self))]
    pub async fn list_products(&self, start_after: Option<String>) -> ProductResult<ScanPage> {
        self.repository.scan(PAGE_SIZE, start_after).await
    }

    /// Validate and store a new product under a freshly generated id
    #[instrument(skip(self, candidate))]
    pub async fn create_product(&self, candidate: Value) -> ProductResult<Product> {
        self.validator
            .validate(&candidate)
            .map_err(ProductError::Validation)?;

        let product = Product::from_candidate(self.ids.generate(), candidate);
        self.repository.put(&product, None).await?;

        tracing::info!(product_id = %product.id, "Product created");
        Ok(product)
    }

    /// Apply a JSON Patch to a product and store the result if nobody else
    /// modified the product in the meantime
    #[instrument(skip(self, patch))]
    pub async fn update_product(&self, id: &str, patch: Value) -> ProductResult<Product> {
        let current = self
            .repository
            .get(id)
            .await?
            .ok_or_else(|| ProductError::NotFound(id.to_string()))?;
        let version = current.last_modified.clone();

        let operations = parse_patch(&patch)?;
        let id_pointer = format!("/{ID_FIELD}");
        if operations.iter().any(|op| op.modifies(&id_pointer)) {
            return Err(PatchError::ProtectedPath(id_pointer).into());
        }

        let patched = apply_patch(&current.to_document(), &operations)?;
        self.validator
            .validate(&patched)
            .map_err(ProductError::Validation)?;

        let mut updated = Product::from_document(id, &version, patched);
        updated.touch();

        self.repository
            .put(&updated, Some(WriteCondition::LastModifiedEquals(version)))
            .await?;

        tracing::info!(
            product_id = %id,
            last_modified = %updated.last_modified,
            "Product updated"
        );
        Ok(updated)
    }
}

impl<R: ProductRepository> Clone for ProductService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
            validator: Arc::clone(&self.validator),
            ids: Arc::clone(&self.ids),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::MockIdGenerator;
    use crate::repository::MockProductRepository;
    use crate::validation::{MockProductValidator, ValidationFailure};
    use mockall::predicate::*;
    use serde_json::json;

    const T0: &str = "2018-01-02T03:04:05.000Z";

    fn stored(id: &str) -> Product {
        Product {
            id: id.to_string(),
            last_modified: T0.to_string(),
            attributes: json!({"name": "Apple", "price": 1})
                .as_object()
                .cloned()
                .unwrap(),
        }
    }

    fn failure(pointer: &str, message: &str) -> ValidationFailure {
        let mut failure = ValidationFailure::new();
        failure.add(pointer, message);
        failure
    }

    fn accepting_validator() -> MockProductValidator {
        let mut validator = MockProductValidator::new();
        validator.expect_validate().returning(|_| Ok(()));
        validator
    }

    #[tokio::test]
    async fn test_list_products_scans_one_page() {
        let mut repo = MockProductRepository::new();
        repo.expect_scan()
            .with(eq(PAGE_SIZE), eq(Some("abc".to_string())))
            .times(1)
            .returning(|_, _| {
                Ok(ScanPage {
                    items: vec![],
                    next_key: None,
                })
            });

        let service = ProductService::new(repo);
        let page = service.list_products(Some("abc".to_string())).await.unwrap();
        assert!(page.items.is_empty());
    }

    #[tokio::test]
    async fn test_create_product_assigns_id() {
        let mut repo = MockProductRepository::new();
        repo.expect_put()
            .withf(|product, condition| {
                product.id == "generated" && product.attributes["name"] == "Pear" && condition.is_none()
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let mut ids = MockIdGenerator::new();
        ids.expect_generate()
            .times(1)
            .returning(|| "generated".to_string());

        let service = ProductService::new(repo)
            .with_validator(accepting_validator())
            .with_id_generator(ids);

        let product = service
            .create_product(json!({"id": "client-chosen", "name": "Pear"}))
            .await
            .unwrap();
        assert_eq!(product.id, "generated");
        assert!(!product.last_modified.is_empty());
    }

    #[tokio::test]
    async fn test_create_product_validation_failure_skips_write() {
        let mut repo = MockProductRepository::new();
        repo.expect_put().never();

        let mut validator = MockProductValidator::new();
        validator
            .expect_validate()
            .returning(|_| Err(failure("/name", "some error")));

        let service = ProductService::new(repo).with_validator(validator);
        let err = service.create_product(json!({})).await.unwrap_err();

        match err {
            ProductError::Validation(f) => assert_eq!(f.into_value(), json!({"/name": "some error"})),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_update_product_guards_on_read_version() {
        let mut repo = MockProductRepository::new();
        repo.expect_get()
            .with(eq("abc"))
            .times(1)
            .returning(|id| Ok(Some(stored(id))));
        repo.expect_put()
            .withf(|product, condition| {
                product.id == "abc"
                    && product.attributes["price"] == 2
                    && product.last_modified.as_str() > T0
                    && *condition == Some(WriteCondition::LastModifiedEquals(T0.to_string()))
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let mut validator = MockProductValidator::new();
        validator
            .expect_validate()
            .withf(|product| product["price"] == 2 && product["id"] == "abc")
            .times(1)
            .returning(|_| Ok(()));

        let service = ProductService::new(repo).with_validator(validator);
        let updated = service
            .update_product(
                "abc",
                json!([{"op": "replace", "path": "/price", "value": 2}]),
            )
            .await
            .unwrap();

        assert_eq!(updated.attributes["price"], 2);
        assert_ne!(updated.last_modified, T0);
    }

    #[tokio::test]
    async fn test_update_product_missing() {
        let mut repo = MockProductRepository::new();
        repo.expect_get().returning(|_| Ok(None));
        repo.expect_put().never();

        let service = ProductService::new(repo);
        let err = service
            .update_product("nope", json!([]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProductError::NotFound(id) if id == "nope"));
    }

    #[tokio::test]
    async fn test_update_product_bad_operation() {
        let mut repo = MockProductRepository::new();
        repo.expect_get().returning(|id| Ok(Some(stored(id))));
        repo.expect_put().never();

        let service = ProductService::new(repo);
        let err = service
            .update_product("abc", json!([{"op": "frobnicate", "path": "/name"}]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProductError::InvalidPatch(PatchError::Malformed { index: 0, .. })
        ));
    }

    #[tokio::test]
    async fn test_update_product_rejects_id_change() {
        let mut repo = MockProductRepository::new();
        repo.expect_get().returning(|id| Ok(Some(stored(id))));
        repo.expect_put().never();

        let service = ProductService::new(repo);
        let err = service
            .update_product(
                "abc",
                json!([{"op": "replace", "path": "/id", "value": "other"}]),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProductError::InvalidPatch(PatchError::ProtectedPath(_))
        ));
    }

    #[tokio::test]
    async fn test_update_product_rejects_root_replace() {
        let mut repo = MockProductRepository::new();
        repo.expect_get().returning(|id| Ok(Some(stored(id))));
        repo.expect_put().never();

        let service = ProductService::new(repo);
        let err = service
            .update_product(
                "abc",
                json!([{"op": "replace", "path": "", "value": {"id": "other", "name": "Pear"}}]),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProductError::InvalidPatch(PatchError::ProtectedPath(_))
        ));
    }

    #[tokio::test]
    async fn test_update_product_failed_test_operation() {
        let mut repo = MockProductRepository::new();
        repo.expect_get().returning(|id| Ok(Some(stored(id))));
        repo.expect_put().never();

        let service = ProductService::new(repo);
        let err = service
            .update_product(
                "abc",
                json!([{"op": "test", "path": "/name", "value": "Banana"}]),
            )
            .await
            .unwrap_err();
        assert!(matches!(&err, ProductError::InvalidPatch(e) if e.is_conflict()));
    }

    #[tokio::test]
    async fn test_update_product_validation_failure_skips_write() {
        let mut repo = MockProductRepository::new();
        repo.expect_get().returning(|id| Ok(Some(stored(id))));
        repo.expect_put().never();

        let mut validator = MockProductValidator::new();
        validator
            .expect_validate()
            .returning(|_| Err(failure("/name", "some error")));

        let service = ProductService::new(repo).with_validator(validator);
        let err = service
            .update_product("abc", json!([{"op": "remove", "path": "/name"}]))
            .await
            .unwrap_err();
        assert!(matches!(err, ProductError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_product_lost_race() {
        let mut repo = MockProductRepository::new();
        repo.expect_get().returning(|id| Ok(Some(stored(id))));
        repo.expect_put()
            .times(1)
            .returning(|_, _| Err(ProductError::ConditionFailed));

        let service = ProductService::new(repo).with_validator(accepting_validator());
        let err = service
            .update_product(
                "abc",
                json!([{"op": "replace", "path": "/name", "value": "Pear"}]),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProductError::ConditionFailed));
    }

    #[tokio::test]
    async fn test_update_product_cannot_forge_version() {
        let mut repo = MockProductRepository::new();
        repo.expect_get().returning(|id| Ok(Some(stored(id))));
        repo.expect_put()
            .withf(|product, _| product.last_modified != "2099-01-01T00:00:00.000Z")
            .times(1)
            .returning(|_, _| Ok(()));

        let service = ProductService::new(repo).with_validator(accepting_validator());
        service
            .update_product(
                "abc",
                json!([{
                    "op": "replace",
                    "path": "/lastModified",
                    "value": "2099-01-01T00:00:00.000Z"
                }]),
            )
            .await
            .unwrap();
    }
}
