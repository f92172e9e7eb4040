use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::CallerIdentity;
use crate::errors::AppError;
use crate::models::category::Category;
use crate::models::comment::Comment;
use crate::models::contact::Contact;
use crate::models::product::{Product, ProductImage};
use crate::store::postgres::{NewContact, NewProduct};
use crate::AppState;

// ── Response shapes ──────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CategoryOut {
    pub id: Uuid,
    pub name: String,
    pub slug: Option<String>,
}

impl From<Category> for CategoryOut {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProductImageOut {
    pub id: Uuid,
    pub image: String,
}

/// A product as the site consumes it: the flat row plus its category
/// (serialized as a list) and gallery images attached.
#[derive(Debug, Serialize)]
pub struct ProductOut {
    pub id: Uuid,
    pub category: Option<Uuid>,
    pub name: String,
    pub slug: Option<String>,
    pub image: Option<String>,
    pub model_car: String,
    pub price: Decimal,
    pub categories: Vec<CategoryOut>,
    pub images: Vec<ProductImageOut>,
}

fn shape_product(
    product: Product,
    category: Option<Category>,
    images: Vec<ProductImage>,
) -> ProductOut {
    ProductOut {
        id: product.id,
        category: product.category_id,
        name: product.name,
        slug: product.slug,
        image: product.image,
        model_car: product.model_car,
        price: product.price,
        categories: category.map(CategoryOut::from).into_iter().collect(),
        images: images
            .into_iter()
            .map(|i| ProductImageOut {
                id: i.id,
                image: i.image,
            })
            .collect(),
    }
}

#[derive(Debug, Serialize)]
pub struct MainPageOut {
    pub id: Uuid,
    pub image: Option<String>,
    pub video: Option<String>,
}

// ── Request payloads ─────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub slug: Option<String>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub category: Option<Uuid>,
    pub name: String,
    pub slug: Option<String>,
    pub image: Option<String>,
    pub model_car: String,
    pub price: Decimal,
    #[serde(default)]
    pub main_page: bool,
    #[serde(default = "default_true")]
    pub available: bool,
}

impl CreateProductRequest {
    pub fn into_new_product(self) -> NewProduct {
        NewProduct {
            category_id: self.category,
            name: self.name,
            slug: self.slug,
            image: self.image,
            model_car: self.model_car,
            price: self.price,
            main_page: self.main_page,
            available: self.available,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub model: String,
    pub content: String,
    pub author: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateContactRequest {
    pub first_name: String,
    pub last_name: Option<String>,
    pub mobile_phone: String,
    pub product: Option<Uuid>,
}

// ── Category handlers ────────────────────────────────────────

/// GET /api/categories
pub async fn list_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CategoryOut>>, AppError> {
    let categories = state.db.list_categories().await.map_err(AppError::Internal)?;
    Ok(Json(categories.into_iter().map(CategoryOut::from).collect()))
}

/// GET /api/categories/:id
pub async fn get_category(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<CategoryOut>, AppError> {
    let category = state
        .db
        .get_category(id)
        .await
        .map_err(AppError::Internal)?
        .ok_or(AppError::NotFound)?;
    Ok(Json(category.into()))
}

/// POST /api/categories (the read-only site service is denied by policy)
pub async fn create_category(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CallerIdentity>,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryOut>), AppError> {
    let category = state
        .db
        .insert_category(
            &payload.name,
            payload.slug.as_deref(),
            Some(&caller.service.name),
        )
        .await
        .map_err(AppError::Internal)?;
    Ok((StatusCode::CREATED, Json(category.into())))
}

// ── Product handlers ─────────────────────────────────────────

/// GET /api/products — every product with category and images attached
pub async fn list_products(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ProductOut>>, AppError> {
    let products = state.db.list_products().await.map_err(AppError::Internal)?;

    let ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
    let mut images_by_product: HashMap<Uuid, Vec<ProductImage>> = HashMap::new();
    for image in state
        .db
        .images_for_products(&ids)
        .await
        .map_err(AppError::Internal)?
    {
        images_by_product
            .entry(image.product_id)
            .or_default()
            .push(image);
    }

    let categories: HashMap<Uuid, Category> = state
        .db
        .list_categories()
        .await
        .map_err(AppError::Internal)?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();

    let shaped = products
        .into_iter()
        .map(|p| {
            let category = p.category_id.and_then(|id| categories.get(&id).cloned());
            let images = images_by_product.remove(&p.id).unwrap_or_default();
            shape_product(p, category, images)
        })
        .collect();

    Ok(Json(shaped))
}

/// GET /api/products/:id
pub async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductOut>, AppError> {
    let product = state
        .db
        .get_product(id)
        .await
        .map_err(AppError::Internal)?
        .ok_or(AppError::NotFound)?;

    let category = match product.category_id {
        Some(category_id) => state
            .db
            .get_category(category_id)
            .await
            .map_err(AppError::Internal)?,
        None => None,
    };
    let images = state
        .db
        .images_for_products(&[product.id])
        .await
        .map_err(AppError::Internal)?;

    Ok(Json(shape_product(product, category, images)))
}

/// POST /api/products
pub async fn create_product(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CallerIdentity>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductOut>), AppError> {
    let new = payload.into_new_product();
    let product = state
        .db
        .insert_product(&new, Some(&caller.service.name))
        .await
        .map_err(AppError::Internal)?;

    let category = match product.category_id {
        Some(category_id) => state
            .db
            .get_category(category_id)
            .await
            .map_err(AppError::Internal)?,
        None => None,
    };

    Ok((
        StatusCode::CREATED,
        Json(shape_product(product, category, Vec::new())),
    ))
}

// ── Comment handlers ─────────────────────────────────────────

/// GET /api/comments
pub async fn list_comments(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Comment>>, AppError> {
    let comments = state.db.list_comments().await.map_err(AppError::Internal)?;
    Ok(Json(comments))
}

/// POST /api/comments
pub async fn create_comment(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<CallerIdentity>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    let comment = state
        .db
        .insert_comment(
            &payload.model,
            &payload.content,
            &payload.author,
            Some(&caller.service.name),
        )
        .await
        .map_err(AppError::Internal)?;
    Ok((StatusCode::CREATED, Json(comment)))
}

// ── Main-page media handlers ─────────────────────────────────

/// GET /api/mainpage — currently available hero media
pub async fn list_main_page(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<MainPageOut>>, AppError> {
    let media = state
        .db
        .list_main_page_media()
        .await
        .map_err(AppError::Internal)?;
    Ok(Json(
        media
            .into_iter()
            .map(|m| MainPageOut {
                id: m.id,
                image: m.image,
                video: m.video,
            })
            .collect(),
    ))
}

// ── Contact handlers ─────────────────────────────────────────

/// POST /api/contacts — store the request, then notify staff by mail.
/// Delivery runs detached: a relay outage never fails the submission.
pub async fn create_contact(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateContactRequest>,
) -> Result<(StatusCode, Json<Contact>), AppError> {
    let new = NewContact {
        first_name: payload.first_name,
        last_name: payload.last_name,
        mobile_phone: payload.mobile_phone,
        product_id: payload.product,
        comment: None,
    };
    let contact = state.db.insert_contact(&new).await.map_err(AppError::Internal)?;

    let product_name = match contact.product_id {
        Some(id) => state
            .db
            .get_product(id)
            .await
            .map_err(AppError::Internal)?
            .map(|p| p.name),
        None => None,
    };

    let notifier = state.notifier.clone();
    let stored = contact.clone();
    tokio::spawn(async move {
        if let Err(e) = notifier
            .send_contact_request(&stored, product_name.as_deref())
            .await
        {
            tracing::warn!(contact = %stored.id, "contact notification failed: {}", e);
        }
    });

    Ok((StatusCode::CREATED, Json(contact)))
}

// ── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn product(category_id: Option<Uuid>) -> Product {
        Product {
            id: Uuid::new_v4(),
            category_id,
            name: "Бампер передній".to_string(),
            slug: Some("bamper-perednii".to_string()),
            image: None,
            model_car: "Model 3".to_string(),
            price: Decimal::new(1250000, 2),
            main_page: false,
            available: true,
            created_by: None,
            updated_by: None,
            created: Utc::now(),
            updated: Utc::now(),
        }
    }

    #[test]
    fn test_shape_attaches_category_and_images() {
        let category = Category {
            id: Uuid::new_v4(),
            name: "Кузов".to_string(),
            slug: Some("kuzov".to_string()),
            created_by: None,
            updated_by: None,
        };
        let p = product(Some(category.id));
        let images = vec![ProductImage {
            id: Uuid::new_v4(),
            product_id: p.id,
            image: "https://cdn.example.com/bumper-1.jpg".to_string(),
        }];

        let shaped = shape_product(p, Some(category.clone()), images);
        assert_eq!(shaped.categories.len(), 1);
        assert_eq!(shaped.categories[0].id, category.id);
        assert_eq!(shaped.images.len(), 1);
        assert_eq!(shaped.images[0].image, "https://cdn.example.com/bumper-1.jpg");
    }

    #[test]
    fn test_shape_without_category_gives_empty_list() {
        let p = product(None);
        let shaped = shape_product(p, None, Vec::new());
        assert!(shaped.categories.is_empty());
        assert!(shaped.images.is_empty());
    }
}
