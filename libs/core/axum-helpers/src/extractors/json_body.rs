//! JSON extractor that rejects with the standard error envelope.

use crate::errors::AppError;
use axum::extract::{FromRequest, Json, Request};
use serde::de::DeserializeOwned;

/// JSON body extractor.
///
/// Accepts any `application/json` or `+json` content type. Missing or
/// unparsable bodies are rejected through [`AppError::JsonExtractorRejection`],
/// so clients always receive an [`ErrorResponse`](crate::errors::ErrorResponse).
///
/// # Example
/// ```ignore
/// use axum::{Router, routing::post};
/// use axum_helpers::extractors::JsonBody;
/// use serde_json::Value;
///
/// async fn create(JsonBody(payload): JsonBody<Value>) -> String {
///     payload.to_string()
/// }
///
/// let app: Router = Router::new().route("/products", post(create));
/// ```
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(data) = Json::<T>::from_request(req, state).await?;
        Ok(JsonBody(data))
    }
}
