use axum::http::{HeaderValue, Method, header};
use std::io;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};

/// Environment variable holding comma-separated allowed origins
pub const CORS_ALLOWED_ORIGIN: &str = "CORS_ALLOWED_ORIGIN";

/// Creates a CORS layer for the given origins.
///
/// Methods are the ones the API serves (GET, POST, PATCH, OPTIONS). The `link`
/// header is exposed so browsers can follow pagination.
pub fn create_cors_layer(allowed_origins: Vec<HeaderValue>) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::LINK])
        .max_age(Duration::from_secs(3600))
}

/// Parse a comma-separated origin list such as
/// `http://localhost:3000,https://example.com`
pub fn parse_origins(origins: &str) -> io::Result<Vec<HeaderValue>> {
    let parsed = origins
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<HeaderValue>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid {CORS_ALLOWED_ORIGIN} value: {e}"),
            )
        })?;

    if parsed.is_empty() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{CORS_ALLOWED_ORIGIN} cannot be empty"),
        ));
    }

    Ok(parsed)
}

/// Build the CORS layer from `CORS_ALLOWED_ORIGIN`.
///
/// Returns `Ok(None)` when the variable is unset, in which case no CORS headers
/// are added.
pub fn cors_layer_from_env() -> io::Result<Option<CorsLayer>> {
    match std::env::var(CORS_ALLOWED_ORIGIN) {
        Ok(origins) => {
            let layer = create_cors_layer(parse_origins(&origins)?);
            tracing::info!("CORS configured with allowed origins: {}", origins);
            Ok(Some(layer))
        }
        Err(_) => Ok(None),
    }
}
