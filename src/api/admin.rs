use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::handlers::{CategoryOut, CreateCategoryRequest, CreateProductRequest};
use crate::auth::token::{generate_token, hash_token};
use crate::errors::AppError;
use crate::models::contact::Contact;
use crate::models::media::MainPageMedia;
use crate::models::product::Product;
use crate::models::service::Service;
use crate::AppState;

/// Administrator label recorded in the audit columns. Absent when the
/// admin client doesn't identify its operator.
fn actor(headers: &HeaderMap) -> Option<&str> {
    headers.get("x-admin-actor").and_then(|v| v.to_str().ok())
}

// ── Service (credential) management ──────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
}

/// Issuance/rotation response. The only place a plaintext token ever
/// leaves the system.
#[derive(Debug, Serialize)]
pub struct IssuedTokenResponse {
    pub id: Uuid,
    pub name: String,
    pub token: String,
    pub message: String,
}

/// GET /admin/api/services
pub async fn list_services(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Service>>, AppError> {
    let services = state.db.list_services().await.map_err(AppError::Internal)?;
    Ok(Json(services))
}

/// POST /admin/api/services — register a service and issue its token
pub async fn create_service(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateServiceRequest>,
) -> Result<(StatusCode, Json<IssuedTokenResponse>), AppError> {
    let token = generate_token();
    let service = state
        .db
        .insert_service(&payload.name, &hash_token(&token), actor(&headers))
        .await?;

    tracing::info!(service = %service.id, name = %service.name, "issued service token");

    Ok((
        StatusCode::CREATED,
        Json(IssuedTokenResponse {
            id: service.id,
            name: service.name,
            message: format!("Use: Authorization: Bearer {}", token),
            token,
        }),
    ))
}

/// POST /admin/api/services/:id/rotate — replace the stored hash.
/// The old token stops authenticating the moment this returns.
pub async fn rotate_service_token(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<IssuedTokenResponse>, AppError> {
    let token = generate_token();
    let service = state
        .db
        .rotate_service_token(id, &hash_token(&token), actor(&headers))
        .await?;

    tracing::info!(service = %service.id, name = %service.name, "rotated service token");

    Ok(Json(IssuedTokenResponse {
        id: service.id,
        name: service.name,
        message: format!("Use: Authorization: Bearer {}", token),
        token,
    }))
}

/// DELETE /admin/api/services/:id
pub async fn delete_service(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.db.delete_service(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Catalog upkeep ───────────────────────────────────────────

/// PUT /admin/api/categories/:id
pub async fn update_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<Json<CategoryOut>, AppError> {
    let category = state
        .db
        .update_category(id, &payload.name, payload.slug.as_deref(), actor(&headers))
        .await
        .map_err(AppError::Internal)?
        .ok_or(AppError::NotFound)?;
    Ok(Json(category.into()))
}

/// DELETE /admin/api/categories/:id
pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = state
        .db
        .delete_category(id)
        .await
        .map_err(AppError::Internal)?;
    if !deleted {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /admin/api/products/:id
pub async fn update_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<CreateProductRequest>,
) -> Result<Json<Product>, AppError> {
    let new = payload.into_new_product();
    let product = state
        .db
        .update_product(id, &new, actor(&headers))
        .await
        .map_err(AppError::Internal)?
        .ok_or(AppError::NotFound)?;
    Ok(Json(product))
}

/// DELETE /admin/api/products/:id
pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = state
        .db
        .delete_product(id)
        .await
        .map_err(AppError::Internal)?;
    if !deleted {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /admin/api/comments/:id
pub async fn delete_comment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = state
        .db
        .delete_comment(id)
        .await
        .map_err(AppError::Internal)?;
    if !deleted {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

// ── Main-page media upkeep ───────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MediaRequest {
    pub image: Option<String>,
    pub video: Option<String>,
    #[serde(default = "default_available")]
    pub available: bool,
}

fn default_available() -> bool {
    true
}

/// POST /admin/api/media
pub async fn create_media(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<MediaRequest>,
) -> Result<(StatusCode, Json<MainPageMedia>), AppError> {
    let media = state
        .db
        .insert_media(
            payload.image.as_deref(),
            payload.video.as_deref(),
            payload.available,
            actor(&headers),
        )
        .await
        .map_err(AppError::Internal)?;
    Ok((StatusCode::CREATED, Json(media)))
}

/// PUT /admin/api/media/:id
pub async fn update_media(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
    Json(payload): Json<MediaRequest>,
) -> Result<Json<MainPageMedia>, AppError> {
    let media = state
        .db
        .update_media(
            id,
            payload.image.as_deref(),
            payload.video.as_deref(),
            payload.available,
            actor(&headers),
        )
        .await
        .map_err(AppError::Internal)?
        .ok_or(AppError::NotFound)?;
    Ok(Json(media))
}

/// DELETE /admin/api/media/:id
pub async fn delete_media(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = state.db.delete_media(id).await.map_err(AppError::Internal)?;
    if !deleted {
        return Err(AppError::NotFound);
    }
    Ok(StatusCode::NO_CONTENT)
}

// ── Contact workflow ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ContactFilter {
    pub done: Option<bool>,
}

/// GET /admin/api/contacts?done=false
pub async fn list_contacts(
    State(state): State<Arc<AppState>>,
    Query(filter): Query<ContactFilter>,
) -> Result<Json<Vec<Contact>>, AppError> {
    let contacts = state
        .db
        .list_contacts(filter.done)
        .await
        .map_err(AppError::Internal)?;
    Ok(Json(contacts))
}

/// POST /admin/api/contacts/:id/done — mark a request as handled
pub async fn mark_contact_done(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<Contact>, AppError> {
    let contact = state
        .db
        .mark_contact_done(id, actor(&headers))
        .await
        .map_err(AppError::Internal)?
        .ok_or(AppError::NotFound)?;
    Ok(Json(contact))
}
