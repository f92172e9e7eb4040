//! Integration tests for the contact-request mail notifier, against a
//! mock mail relay.

use chrono::Utc;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shop_api::models::contact::Contact;
use shop_api::notification::email::EmailNotifier;

fn contact(first_name: &str, phone: &str) -> Contact {
    Contact {
        id: Uuid::new_v4(),
        first_name: first_name.to_string(),
        last_name: None,
        mobile_phone: phone.to_string(),
        product_id: None,
        done: false,
        comment: None,
        created: Utc::now(),
        updated: Utc::now(),
        updated_by: None,
    }
}

#[tokio::test]
async fn sends_one_mail_per_contact_request() {
    let relay = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send"))
        .and(body_partial_json(serde_json::json!({
            "to": "shop@example.com"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&relay)
        .await;

    let notifier = EmailNotifier::new(
        Some(format!("{}/send", relay.uri())),
        Some("shop@example.com".to_string()),
    );

    notifier
        .send_contact_request(&contact("Олена", "+380501234567"), Some("Бампер Model 3"))
        .await
        .unwrap();
}

#[tokio::test]
async fn unconfigured_relay_is_a_silent_noop() {
    let relay = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&relay)
        .await;

    // No webhook URL configured — must not call anything and must not fail.
    let notifier = EmailNotifier::new(None, Some("shop@example.com".to_string()));
    notifier
        .send_contact_request(&contact("Ivan", "+380991112233"), None)
        .await
        .unwrap();
}

#[tokio::test]
async fn relay_error_is_reported() {
    let relay = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&relay)
        .await;

    let notifier = EmailNotifier::new(
        Some(relay.uri()),
        Some("shop@example.com".to_string()),
    );

    let err = notifier
        .send_contact_request(&contact("Ivan", "+380991112233"), None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("mail relay returned error"));
}
