use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;

use crate::auth::{authenticate, policy};
use crate::errors::AppError;
use crate::AppState;

/// Middleware guarding the public resource API.
///
/// Authenticates the bearer token against the credential store, applies
/// the access policy for the request method, and hands the resolved
/// caller to handlers as a request extension. Authentication is checked
/// first: an unauthenticated caller gets the 401 challenge, never a 403.
pub async fn service_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let authorization = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let caller = authenticate(&state.db, authorization).await?;

    if !policy::is_allowed(Some(&caller.service), req.method()) {
        tracing::warn!(
            service = %caller.service.name,
            method = %req.method(),
            "access policy denied request"
        );
        return Err(AppError::Forbidden);
    }

    tracing::debug!(service = %caller.service.name, "authenticated service");
    req.extensions_mut().insert(caller);
    Ok(next.run(req).await)
}
