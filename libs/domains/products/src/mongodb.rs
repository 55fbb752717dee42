//! MongoDB implementation of ProductRepository
//!
//! Products are stored one document per product in the collection named by the
//! table name. The product id is the document `_id`; every other attribute,
//! `lastModified` included, is stored as a top-level field.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{self, doc, Bson, Document},
    options::FindOptions,
    Collection, Database,
};
use serde_json::{Map, Value};
use tracing::instrument;

use crate::error::{ProductError, ProductResult};
use crate::models::{Product, ScanPage, WriteCondition, ID_FIELD, LAST_MODIFIED_FIELD};
use crate::repository::ProductRepository;

/// Default collection name
pub const DEFAULT_TABLE_NAME: &str = "Products";

const MONGO_ID: &str = "_id";

/// MongoDB implementation of the ProductRepository
pub struct MongoProductRepository {
    collection: Collection<Document>,
}

impl MongoProductRepository {
    /// Create a repository over a named collection
    pub fn with_collection(db: &Database, collection_name: &str) -> Self {
        Self {
            collection: db.collection::<Document>(collection_name),
        }
    }

    /// Convert a product into its stored form
    fn to_bson_document(product: &Product) -> ProductResult<Document> {
        let mut document = bson::to_document(&product.attributes)?;
        document.remove(MONGO_ID);
        document.insert(MONGO_ID, product.id.as_str());
        document.insert(LAST_MODIFIED_FIELD, product.last_modified.as_str());
        Ok(document)
    }

    /// Convert a stored document back into a product
    fn from_bson_document(mut document: Document) -> ProductResult<Product> {
        let id = match document.remove(MONGO_ID) {
            Some(Bson::String(id)) => id,
            Some(other) => other.to_string(),
            None => {
                return Err(ProductError::Internal(
                    "stored product has no _id".to_string(),
                ))
            }
        };
        let last_modified = match document.remove(LAST_MODIFIED_FIELD) {
            Some(Bson::String(value)) => value,
            Some(other) => other.to_string(),
            None => String::new(),
        };
        document.remove(ID_FIELD);

        let attributes = match Bson::Document(document).into_relaxed_extjson() {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        Ok(Product {
            id,
            last_modified,
            attributes,
        })
    }

    fn scan_filter(start_after: Option<&str>) -> Document {
        match start_after {
            Some(key) => doc! { "_id": { "$gt": key } },
            None => doc! {},
        }
    }

    /// Matches the stored product only while it still carries the expected version
    fn condition_filter(id: &str, condition: &WriteCondition) -> Document {
        match condition {
            WriteCondition::LastModifiedEquals(expected) => doc! {
                "_id": id,
                "lastModified": expected.as_str(),
            },
        }
    }
}

#[async_trait]
impl ProductRepository for MongoProductRepository {
    #[instrument(skip(self))]
    async fn scan(&self, limit: usize, start_after: Option<String>) -> ProductResult<ScanPage> {
        // One extra document tells whether another page exists
        let options = FindOptions::builder()
            .sort(doc! { "_id": 1 })
            .limit(limit as i64 + 1)
            .build();

        let cursor = self
            .collection
            .find(Self::scan_filter(start_after.as_deref()))
            .with_options(options)
            .await?;
        let documents: Vec<Document> = cursor.try_collect().await?;

        let has_more = documents.len() > limit;
        let items = documents
            .into_iter()
            .take(limit)
            .map(Self::from_bson_document)
            .collect::<ProductResult<Vec<_>>>()?;
        let next_key = if has_more {
            items.last().map(|p| p.id.clone())
        } else {
            None
        };

        tracing::debug!(count = items.len(), has_more, "Scanned products");
        Ok(ScanPage { items, next_key })
    }

    #[instrument(skip(self))]
    async fn get(&self, id: &str) -> ProductResult<Option<Product>> {
        self.collection
            .find_one(doc! { "_id": id })
            .await?
            .map(Self::from_bson_document)
            .transpose()
    }

    #[instrument(skip(self, product), fields(product_id = %product.id))]
    async fn put(
        &self,
        product: &Product,
        condition: Option<WriteCondition>,
    ) -> ProductResult<()> {
        let document = Self::to_bson_document(product)?;

        match condition {
            None => {
                self.collection
                    .replace_one(doc! { "_id": product.id.as_str() }, document)
                    .upsert(true)
                    .await?;
            }
            Some(condition) => {
                // Filter and replace run as one atomic document operation
                let filter = Self::condition_filter(&product.id, &condition);
                let result = self.collection.replace_one(filter, document).await?;
                if result.matched_count == 0 {
                    tracing::info!(product_id = %product.id, "Conditional write rejected");
                    return Err(ProductError::ConditionFailed);
                }
            }
        }

        tracing::info!(product_id = %product.id, "Product stored");
        Ok(())
    }
}
