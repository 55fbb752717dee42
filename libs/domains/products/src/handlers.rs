//! HTTP handlers for Products API

use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, patch},
    Json, Router,
};
use axum_helpers::{
    errors::responses::{
        ConflictResponse, InternalServerErrorResponse, InvalidPatchResponse, NotFoundResponse,
    },
    JsonBody,
};
use serde_json::Value;
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::ProductResult;
use crate::models::{ListQuery, Product};
use crate::repository::ProductRepository;
use crate::service::ProductService;

/// OpenAPI documentation for Products API
#[derive(OpenApi)]
#[openapi(
    paths(list_products, create_product, update_product),
    components(
        schemas(Product),
        responses(
            InvalidPatchResponse,
            NotFoundResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Products", description = "Product management endpoints")
    )
)]
pub struct ApiDoc;

/// Create the products router with all HTTP endpoints
pub fn router<R: ProductRepository + 'static>(service: ProductService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/{id}", patch(update_product))
        .with_state(shared_service)
}

/// Build the `link` header pointing at the next page
pub fn next_page_link(path: &str, next_key: &str) -> String {
    format!(
        "<{}?_lek={}>; rel=\"next\"",
        path,
        urlencoding::encode(next_key)
    )
}

/// List products, one page at a time
#[utoipa::path(
    get,
    path = "",
    tag = "Products",
    params(ListQuery),
    responses(
        (status = 200, description = "Page of products", body = Vec<Product>,
            headers(("link" = String, description = "Present when more products exist: `<...?_lek=...>; rel=\"next\"`"))
        ),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_products<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    OriginalUri(uri): OriginalUri,
    Query(query): Query<ListQuery>,
) -> ProductResult<Response> {
    let page = service.list_products(query.lek).await?;

    let mut response = Json(page.items).into_response();
    if let Some(next_key) = page.next_key {
        let link = next_page_link(uri.path(), &next_key);
        match HeaderValue::from_str(&link) {
            Ok(value) => {
                response.headers_mut().insert(header::LINK, value);
            }
            Err(e) => tracing::warn!(error = %e, "Skipping unrepresentable link header"),
        }
    }

    Ok(response)
}

/// Create a new product
#[utoipa::path(
    post,
    path = "",
    tag = "Products",
    request_body(content = Object, description = "Candidate product; `id` and `lastModified` are assigned by the server",
        example = json!({"name": "Apple", "price": 1.5})
    ),
    responses(
        (status = 200, description = "Product created", body = Product),
        (status = 400, description = "Product failed validation", body = Object,
            example = json!({"/name": "name is required"})
        ),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    JsonBody(candidate): JsonBody<Value>,
) -> ProductResult<Json<Product>> {
    let product = service.create_product(candidate).await?;
    Ok(Json(product))
}

/// Apply a JSON Patch to a product
///
/// Patches are applied in order and stored only if the product has not been
/// modified since it was read.
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Products",
    params(
        ("id" = String, Path, description = "Product ID")
    ),
    request_body(content = Vec<Object>, description = "JSON Patch operations",
        content_type = "application/json-patch+json",
        example = json!([
            {"op": "test", "path": "/name", "value": "Apple"},
            {"op": "replace", "path": "/name", "value": "Grape"}
        ])
    ),
    responses(
        (status = 200, description = "Product updated", body = Product),
        (status = 400, response = InvalidPatchResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn update_product<R: ProductRepository>(
    State(service): State<Arc<ProductService<R>>>,
    Path(id): Path<String>,
    JsonBody(operations): JsonBody<Value>,
) -> ProductResult<Json<Product>> {
    let product = service.update_product(&id, operations).await?;
    Ok(Json(product))
}
