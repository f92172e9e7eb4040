//! Integration tests for the service-token authentication core.
//!
//! These tests verify:
//! 1. Header parsing rejects every malformed `Authorization` shape uniformly
//! 2. Token lookup is hash-based and resolves exactly one service
//! 3. Rotation invalidates the old token immediately
//! 4. The access policy keeps the public site read-only
//!
//! The credential store is an in-memory `ServiceStore` — no database needed.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::http::{header, Method, StatusCode};
use axum::response::IntoResponse;
use chrono::Utc;
use uuid::Uuid;

use shop_api::auth::token::{generate_token, hash_token, TOKEN_LENGTH};
use shop_api::auth::{authenticate, policy, ServiceStore};
use shop_api::errors::AppError;
use shop_api::models::service::Service;

/// Credential store backed by a map from token hash to service.
struct MemoryStore {
    by_hash: Mutex<HashMap<String, Service>>,
}

impl MemoryStore {
    fn new() -> Self {
        Self {
            by_hash: Mutex::new(HashMap::new()),
        }
    }

    /// Register a service and return its plaintext token.
    fn issue(&self, name: &str) -> (Uuid, String) {
        let token = generate_token();
        let service = Service {
            id: Uuid::new_v4(),
            name: name.to_string(),
            token_hash: hash_token(&token),
            created_by: Some("admin".to_string()),
            updated_by: Some("admin".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let id = service.id;
        self.by_hash
            .lock()
            .unwrap()
            .insert(service.token_hash.clone(), service);
        (id, token)
    }

    /// Replace the stored hash for one service, returning the new token.
    fn rotate(&self, id: Uuid) -> String {
        let mut by_hash = self.by_hash.lock().unwrap();
        let old_hash = by_hash
            .iter()
            .find(|(_, s)| s.id == id)
            .map(|(h, _)| h.clone())
            .expect("service exists");
        let mut service = by_hash.remove(&old_hash).unwrap();
        let token = generate_token();
        service.token_hash = hash_token(&token);
        by_hash.insert(service.token_hash.clone(), service);
        token
    }
}

#[async_trait]
impl ServiceStore for MemoryStore {
    async fn find_by_token_hash(&self, token_hash: &str) -> anyhow::Result<Option<Service>> {
        Ok(self.by_hash.lock().unwrap().get(token_hash).cloned())
    }
}

mod authenticator_tests {
    use super::*;

    #[tokio::test]
    async fn missing_header_fails() {
        let store = MemoryStore::new();
        let err = authenticate(&store, None).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidServiceToken));
    }

    #[tokio::test]
    async fn header_without_credential_part_fails() {
        let store = MemoryStore::new();
        store.issue("Сайт");

        for header in ["", "Bearer", "sometokenwithoutscheme"] {
            let err = authenticate(&store, Some(header)).await.unwrap_err();
            assert!(
                matches!(err, AppError::InvalidServiceToken),
                "header {:?} must fail uniformly",
                header
            );
        }
    }

    #[tokio::test]
    async fn unknown_token_fails() {
        let store = MemoryStore::new();
        store.issue("Сайт");

        let err = authenticate(&store, Some("Bearer wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidServiceToken));
    }

    #[tokio::test]
    async fn valid_token_resolves_its_service() {
        let store = MemoryStore::new();
        let (site_id, site_token) = store.issue("Сайт");
        let (_, other_token) = store.issue("Mobile App");
        assert_ne!(site_token, other_token);

        let caller = authenticate(&store, Some(&format!("Bearer {}", site_token)))
            .await
            .unwrap();
        assert_eq!(caller.service.id, site_id);
        assert_eq!(caller.service.name, "Сайт");
    }

    #[tokio::test]
    async fn scheme_word_is_not_inspected() {
        // The contract requires "<scheme> <credential>"; only the
        // credential part authenticates.
        let store = MemoryStore::new();
        let (id, token) = store.issue("Сайт");

        let caller = authenticate(&store, Some(&format!("Token {}", token)))
            .await
            .unwrap();
        assert_eq!(caller.service.id, id);
    }

    #[tokio::test]
    async fn issued_tokens_are_high_entropy() {
        let store = MemoryStore::new();
        let (_, token) = store.issue("Сайт");
        assert_eq!(token.len(), TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}

mod rotation_tests {
    use super::*;

    #[tokio::test]
    async fn rotation_invalidates_old_token_immediately() {
        let store = MemoryStore::new();
        let (id, old_token) = store.issue("Сайт");

        let new_token = store.rotate(id);
        assert_ne!(old_token, new_token);

        let err = authenticate(&store, Some(&format!("Bearer {}", old_token)))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidServiceToken));

        let caller = authenticate(&store, Some(&format!("Bearer {}", new_token)))
            .await
            .unwrap();
        assert_eq!(caller.service.id, id);
    }
}

mod policy_tests {
    use super::*;

    fn named(name: &str) -> Service {
        Service {
            id: Uuid::new_v4(),
            name: name.to_string(),
            token_hash: String::new(),
            created_by: None,
            updated_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn site_service_may_only_read() {
        let site = named("Сайт");
        assert!(policy::is_allowed(Some(&site), &Method::GET));
        assert!(!policy::is_allowed(Some(&site), &Method::POST));
        assert!(!policy::is_allowed(Some(&site), &Method::PUT));
        assert!(!policy::is_allowed(Some(&site), &Method::PATCH));
        assert!(!policy::is_allowed(Some(&site), &Method::DELETE));
    }

    #[test]
    fn other_services_are_unrestricted() {
        let partner = named("Склад");
        for method in [Method::GET, Method::POST, Method::PUT, Method::DELETE] {
            assert!(policy::is_allowed(Some(&partner), &method));
        }
    }

    #[test]
    fn non_service_caller_is_denied() {
        assert!(!policy::is_allowed(None, &Method::GET));
    }
}

mod response_contract_tests {
    use super::*;

    #[test]
    fn auth_failure_is_401_with_bearer_challenge() {
        let response = AppError::InvalidServiceToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response
                .headers()
                .get(header::WWW_AUTHENTICATE)
                .and_then(|v| v.to_str().ok()),
            Some("Bearer")
        );
    }

    #[test]
    fn policy_denial_is_403() {
        let response = AppError::Forbidden.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }

    #[test]
    fn duplicate_hash_is_surfaced_as_configuration_error() {
        let response = AppError::DuplicateTokenHash.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
