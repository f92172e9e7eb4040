use axum::http::Method;

use crate::models::service::Service;

/// Services restricted to read-only access, by display name. Exactly one
/// row today: the public-facing site. Extending the policy means adding
/// rows here, not new logic.
const READ_ONLY_SERVICES: &[&str] = &["Сайт"];

/// Per-request access decision. Stateless; deny maps to 403 and is never
/// retried.
///
/// A caller that is not an authenticated service is denied outright.
pub fn is_allowed(caller: Option<&Service>, method: &Method) -> bool {
    let Some(service) = caller else {
        return false;
    };

    if READ_ONLY_SERVICES.contains(&service.name.as_str()) && method != &Method::GET {
        return false;
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn service(name: &str) -> Service {
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
    fn test_site_service_is_read_only() {
        let site = service("Сайт");
        assert!(is_allowed(Some(&site), &Method::GET));
        assert!(!is_allowed(Some(&site), &Method::POST));
        assert!(!is_allowed(Some(&site), &Method::PUT));
        assert!(!is_allowed(Some(&site), &Method::DELETE));
    }

    #[test]
    fn test_other_services_get_all_methods() {
        let partner = service("Mobile App");
        assert!(is_allowed(Some(&partner), &Method::GET));
        assert!(is_allowed(Some(&partner), &Method::POST));
        assert!(is_allowed(Some(&partner), &Method::DELETE));
    }

    #[test]
    fn test_anonymous_caller_is_denied() {
        assert!(!is_allowed(None, &Method::GET));
    }
}
