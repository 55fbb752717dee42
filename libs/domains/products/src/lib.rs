//! Products Domain
//!
//! Schemaless product documents with server-assigned ids, JSON Patch updates and
//! optimistic concurrency on a `lastModified` version token.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Validation, JSON Patch, version tokens
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← scan / get / conditional put (MongoDB or in-memory)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Product, ScanPage, WriteCondition
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_products::{
//!     handlers,
//!     mongodb::MongoProductRepository,
//!     service::ProductService,
//! };
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("products");
//!
//! let repository = MongoProductRepository::with_collection(&db, "Products");
//! let service = ProductService::new(repository);
//!
//! let router = handlers::router(service);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod ids;
pub mod memory;
pub mod models;
pub mod mongodb;
pub mod patch;
pub mod repository;
pub mod service;
pub mod validation;

// Re-export commonly used types
pub use error::{ProductError, ProductResult};
pub use handlers::ApiDoc;
pub use ids::{IdGenerator, UuidIdGenerator};
pub use memory::InMemoryProductRepository;
pub use models::{ListQuery, Product, ScanPage, WriteCondition, PAGE_SIZE};
pub use self::mongodb::{MongoProductRepository, DEFAULT_TABLE_NAME};
pub use patch::{PatchError, PatchOperation};
pub use repository::ProductRepository;
pub use service::ProductService;
pub use validation::{DefaultProductValidator, ProductValidator, ValidationFailure};
