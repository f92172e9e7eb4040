use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::middleware::{response_cache::response_cache, service_auth::service_auth};
use crate::AppState;

pub mod admin;
pub mod handlers;

/// Build the public resource router, consumed by the front-end site and
/// other registered services. The caller mounts this under `/api`.
///
/// Layer order matters: authentication and the access policy run first,
/// the response cache only sees requests that already passed both.
pub fn api_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/categories",
            get(handlers::list_categories).post(handlers::create_category),
        )
        .route("/categories/:id", get(handlers::get_category))
        .route(
            "/products",
            get(handlers::list_products).post(handlers::create_product),
        )
        .route("/products/:id", get(handlers::get_product))
        .route(
            "/comments",
            get(handlers::list_comments).post(handlers::create_comment),
        )
        .route("/mainpage", get(handlers::list_main_page))
        .route("/contacts", post(handlers::create_contact))
        .layer(middleware::from_fn_with_state(state.clone(), response_cache))
        .layer(middleware::from_fn_with_state(state, service_auth))
        .layer(TraceLayer::new_for_http())
        .fallback(fallback_404)
}

/// Build the management router: service issuance/rotation and catalog
/// upkeep. The caller mounts this under `/admin/api`.
pub fn admin_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/services",
            get(admin::list_services).post(admin::create_service),
        )
        .route("/services/:id", delete(admin::delete_service))
        .route("/services/:id/rotate", post(admin::rotate_service_token))
        .route(
            "/categories/:id",
            put(admin::update_category).delete(admin::delete_category),
        )
        .route(
            "/products/:id",
            put(admin::update_product).delete(admin::delete_product),
        )
        .route("/comments/:id", delete(admin::delete_comment))
        .route("/media", post(admin::create_media))
        .route(
            "/media/:id",
            put(admin::update_media).delete(admin::delete_media),
        )
        .route("/contacts", get(admin::list_contacts))
        .route("/contacts/:id/done", post(admin::mark_contact_done))
        .layer(middleware::from_fn_with_state(state, admin_auth))
        .layer(TraceLayer::new_for_http())
        .fallback(fallback_404)
}

async fn fallback_404() -> StatusCode {
    StatusCode::NOT_FOUND
}

/// Middleware: validates `X-Admin-Key` (or `Authorization: Bearer`)
/// against the configured admin key. Returns 401 if missing/invalid.
async fn admin_auth(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let provided_key = req
        .headers()
        .get("x-admin-key")
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            req.headers()
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(|t| t.trim())
        });

    match provided_key {
        Some(k) if k == state.config.admin_key => Ok(next.run(req).await),
        Some(k) => {
            // SECURITY: Never log the expected key or the full provided key
            let masked = if k.len() > 8 && k.is_ascii() {
                format!("{}…{}", &k[..4], &k[k.len() - 4..])
            } else {
                "****".to_string()
            };
            tracing::warn!("admin API: invalid key (provided: '{}')", masked);
            Err(StatusCode::UNAUTHORIZED)
        }
        None => {
            tracing::warn!("admin API: missing X-Admin-Key header");
            Err(StatusCode::UNAUTHORIZED)
        }
    }
}
