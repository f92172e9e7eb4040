use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Customer review, keyed by car model so the site can show reviews
/// next to matching products.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub model: String,
    pub content: String,
    pub author: String,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
}
