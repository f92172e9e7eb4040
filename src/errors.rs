use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication failed: missing/malformed header or unknown token.
    /// One variant for all three cases; the response must not reveal
    /// which check rejected the request.
    #[error("invalid service token")]
    InvalidServiceToken,

    #[error("request denied by access policy")]
    Forbidden,

    #[error("not found")]
    NotFound,

    /// A freshly issued token hashed to a value already held by another
    /// service. Fatal configuration error; the credential is not saved.
    #[error("duplicate token hash")]
    DuplicateTokenHash,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code, msg) = match &self {
            AppError::InvalidServiceToken => (
                StatusCode::UNAUTHORIZED,
                "authentication_error",
                "invalid_service_token",
                "Invalid service token.".to_string(),
            ),
            AppError::Forbidden => (
                StatusCode::FORBIDDEN,
                "permission_error",
                "forbidden",
                "request denied by access policy".to_string(),
            ),
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                "invalid_request_error",
                "not_found",
                "resource not found".to_string(),
            ),
            AppError::DuplicateTokenHash => {
                tracing::error!("token hash collision, refusing to overwrite existing credential");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "configuration_error",
                    "duplicate_token_hash",
                    "token hash collision, credential not saved".to_string(),
                )
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
            AppError::Redis(e) => {
                tracing::error!("Redis error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal_server_error",
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "message": msg,
                "type": error_type,
                "code": code,
            }
        }));

        let mut response = (status, body).into_response();

        // Advertise the expected scheme when challenging.
        if matches!(self, AppError::InvalidServiceToken) {
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer"),
            );
        }

        response
    }
}
