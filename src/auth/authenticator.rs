use async_trait::async_trait;

use super::token::hash_token;
use crate::errors::AppError;
use crate::models::service::Service;

/// Read-side contract the authenticator needs from the credential store.
///
/// Implemented by `PgStore`; tests substitute an in-memory map.
#[async_trait]
pub trait ServiceStore: Send + Sync {
    /// Point lookup by hashed token. `None` when no service matches.
    async fn find_by_token_hash(&self, token_hash: &str) -> anyhow::Result<Option<Service>>;
}

/// The service resolved from a matched token, valid for one request.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub service: Service,
}

/// Resolve the caller from a raw `Authorization` header value.
///
/// The header is parsed as `<scheme> <credential>`, split on the first
/// space only. The scheme word is not inspected: the 401 challenge
/// advertises `Bearer`, but authentication rests entirely on the
/// credential part matching a stored hash.
///
/// Every failure mode (missing header, malformed header, unknown token)
/// collapses into the same `InvalidServiceToken` error so a probing
/// caller cannot tell which check rejected it.
pub async fn authenticate<S>(
    store: &S,
    authorization: Option<&str>,
) -> Result<CallerIdentity, AppError>
where
    S: ServiceStore + ?Sized,
{
    let header = authorization.ok_or(AppError::InvalidServiceToken)?;
    let (_scheme, candidate) = header
        .split_once(' ')
        .ok_or(AppError::InvalidServiceToken)?;

    let service = store
        .find_by_token_hash(&hash_token(candidate))
        .await
        .map_err(AppError::Internal)?
        .ok_or(AppError::InvalidServiceToken)?;

    Ok(CallerIdentity { service })
}
