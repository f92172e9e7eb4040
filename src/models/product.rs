use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog item. `image` and the rows in `product_images` are URLs on the
/// media CDN; the backend never stores file bytes.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub slug: Option<String>,
    pub image: Option<String>,
    pub model_car: String,
    pub price: Decimal,
    pub main_page: bool,
    pub available: bool,
    pub created_by: Option<String>,
    pub updated_by: Option<String>,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

/// Extra gallery image attached to a product.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductImage {
    pub id: Uuid,
    pub product_id: Uuid,
    pub image: String,
}
