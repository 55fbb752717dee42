//! Products API routes

use axum::Router;
use domain_products::{handlers, InMemoryProductRepository, MongoProductRepository, ProductService};

use crate::state::AppState;

/// Create products router over the configured store
pub fn router(state: &AppState) -> Router {
    match &state.mongo {
        Some(mongo) => {
            let repository =
                MongoProductRepository::with_collection(&mongo.db, &state.config.table_name);
            handlers::router(ProductService::new(repository))
        }
        None => handlers::router(ProductService::new(InMemoryProductRepository::new())),
    }
}
