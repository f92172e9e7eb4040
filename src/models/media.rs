use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Hero image/video shown on the landing page. Only rows with
/// `available = true` are served to the site.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MainPageMedia {
    pub id: Uuid,
    pub image: Option<String>,
    pub video: Option<String>,
    pub available: bool,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}
