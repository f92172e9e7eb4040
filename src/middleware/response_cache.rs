use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::extract::{Request, State};
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::AppState;

/// Upper bound on a single cached body. Larger responses are served
/// normally but skipped by the cache.
const MAX_CACHE_ENTRY_BYTES: usize = 256 * 1024;

/// A rendered response body held for its TTL window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl IntoResponse for CachedResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        let mut response = (status, self.body).into_response();
        if let Ok(v) = HeaderValue::from_str(&self.content_type) {
            response.headers_mut().insert(header::CONTENT_TYPE, v);
        }
        response
    }
}

pub fn cache_key(uri: &str) -> String {
    format!("resp:{}", uri)
}

/// Main-page media changes rarely; catalog data every couple of minutes.
fn ttl_for_path(path: &str, catalog_ttl: u64, media_ttl: u64) -> u64 {
    if path.starts_with("/mainpage") || path.starts_with("/api/mainpage") {
        media_ttl
    } else {
        catalog_ttl
    }
}

/// Middleware caching successful GET responses, keyed by request URL.
///
/// Layered inside the auth middleware: every request is authenticated
/// and authorized before the cache is consulted. The cache stores final
/// response bodies only and never short-circuits an auth decision.
pub async fn response_cache(State(state): State<Arc<AppState>>, req: Request, next: Next) -> Response {
    if req.method() != Method::GET {
        return next.run(req).await;
    }

    let uri = req.uri().to_string();
    let key = cache_key(&uri);
    if let Some(hit) = state.cache.get::<CachedResponse>(&key).await {
        tracing::debug!(uri = %uri, "response cache hit");
        return hit.into_response();
    }

    let ttl = ttl_for_path(
        req.uri().path(),
        state.config.cache_ttl_secs,
        state.config.media_cache_ttl_secs,
    );

    let response = next.run(req).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(b) => b,
        Err(e) => {
            tracing::error!("failed to buffer response for caching: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    if bytes.len() <= MAX_CACHE_ENTRY_BYTES {
        let content_type = parts
            .headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/json")
            .to_string();
        let cached = CachedResponse {
            status: parts.status.as_u16(),
            content_type,
            body: bytes.to_vec(),
        };
        if let Err(e) = state.cache.set(&key, &cached, ttl).await {
            tracing::warn!("failed to cache response: {}", e);
        }
    } else {
        tracing::debug!(
            key = %key,
            size_bytes = bytes.len(),
            "skipping cache — response exceeds size limit"
        );
    }

    Response::from_parts(parts, Body::from(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_key_includes_query() {
        assert_eq!(cache_key("/api/products?page=2"), "resp:/api/products?page=2");
        assert_ne!(cache_key("/api/products"), cache_key("/api/products?page=2"));
    }

    #[test]
    fn test_ttl_selection_by_path() {
        assert_eq!(ttl_for_path("/mainpage", 120, 1800), 1800);
        assert_eq!(ttl_for_path("/categories", 120, 1800), 120);
        assert_eq!(ttl_for_path("/products/abc", 120, 1800), 120);
    }
}
