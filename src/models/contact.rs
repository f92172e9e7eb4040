use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A call-me-back request submitted through the site's contact form.
/// `done` is flipped by an administrator once the customer has been called.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contact {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: Option<String>,
    pub mobile_phone: String,
    pub product_id: Option<Uuid>,
    pub done: bool,
    pub comment: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
    pub updated_by: Option<String>,
}
