use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::ServiceStore;
use crate::errors::AppError;
use crate::models::category::Category;
use crate::models::comment::Comment;
use crate::models::contact::Contact;
use crate::models::media::MainPageMedia;
use crate::models::product::{Product, ProductImage};
use crate::models::service::Service;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

/// Postgres unique_violation. A duplicate `token_hash` would let two
/// services share a credential; treated as a configuration error, never
/// an overwrite.
fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

fn map_credential_err(e: sqlx::Error) -> AppError {
    if is_unique_violation(&e) {
        AppError::DuplicateTokenHash
    } else {
        AppError::Database(e)
    }
}

const SERVICE_COLUMNS: &str =
    "id, name, token_hash, created_by, updated_by, created_at, updated_at";

impl PgStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run pending migrations from the migrations/ directory.
    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    // -- Service (credential) operations --

    /// Register a service with an already-hashed token.
    /// Fails with `DuplicateTokenHash` if the hash is taken.
    pub async fn insert_service(
        &self,
        name: &str,
        token_hash: &str,
        actor: Option<&str>,
    ) -> Result<Service, AppError> {
        let row = sqlx::query_as::<_, Service>(&format!(
            "INSERT INTO services (name, token_hash, created_by, updated_by)
             VALUES ($1, $2, $3, $3)
             RETURNING {SERVICE_COLUMNS}"
        ))
        .bind(name)
        .bind(token_hash)
        .bind(actor)
        .fetch_one(&self.pool)
        .await
        .map_err(map_credential_err)?;

        Ok(row)
    }

    /// Replace a service's stored hash. Single-statement UPDATE, so a
    /// concurrent reader sees either the old or the new hash.
    pub async fn rotate_service_token(
        &self,
        id: Uuid,
        token_hash: &str,
        actor: Option<&str>,
    ) -> Result<Service, AppError> {
        let row = sqlx::query_as::<_, Service>(&format!(
            "UPDATE services
             SET token_hash = $2, updated_by = $3, updated_at = NOW()
             WHERE id = $1
             RETURNING {SERVICE_COLUMNS}"
        ))
        .bind(id)
        .bind(token_hash)
        .bind(actor)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_credential_err)?;

        row.ok_or(AppError::NotFound)
    }

    pub async fn list_services(&self) -> anyhow::Result<Vec<Service>> {
        let rows = sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services ORDER BY created_at ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Hard delete. Services are never soft-deleted.
    pub async fn delete_service(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM services WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    // -- Category operations --

    pub async fn list_categories(&self) -> anyhow::Result<Vec<Category>> {
        let rows =
            sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    pub async fn get_category(&self, id: Uuid) -> anyhow::Result<Option<Category>> {
        let row = sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn insert_category(
        &self,
        name: &str,
        slug: Option<&str>,
        actor: Option<&str>,
    ) -> anyhow::Result<Category> {
        let row = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, slug, created_by, updated_by)
             VALUES ($1, $2, $3, $3)
             RETURNING *",
        )
        .bind(name)
        .bind(slug)
        .bind(actor)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update_category(
        &self,
        id: Uuid,
        name: &str,
        slug: Option<&str>,
        actor: Option<&str>,
    ) -> anyhow::Result<Option<Category>> {
        let row = sqlx::query_as::<_, Category>(
            "UPDATE categories SET name = $2, slug = $3, updated_by = $4
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(slug)
        .bind(actor)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete_category(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -- Product operations --

    pub async fn list_products(&self) -> anyhow::Result<Vec<Product>> {
        let rows =
            sqlx::query_as::<_, Product>("SELECT * FROM products ORDER BY created DESC")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows)
    }

    pub async fn get_product(&self, id: Uuid) -> anyhow::Result<Option<Product>> {
        let row = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Gallery images for a batch of products, one round trip.
    pub async fn images_for_products(
        &self,
        product_ids: &[Uuid],
    ) -> anyhow::Result<Vec<ProductImage>> {
        let rows = sqlx::query_as::<_, ProductImage>(
            "SELECT * FROM product_images WHERE product_id = ANY($1)",
        )
        .bind(product_ids)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn insert_product(
        &self,
        new: &NewProduct,
        actor: Option<&str>,
    ) -> anyhow::Result<Product> {
        let row = sqlx::query_as::<_, Product>(
            "INSERT INTO products
                 (category_id, name, slug, image, model_car, price, main_page, available,
                  created_by, updated_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
             RETURNING *",
        )
        .bind(new.category_id)
        .bind(&new.name)
        .bind(&new.slug)
        .bind(&new.image)
        .bind(&new.model_car)
        .bind(new.price)
        .bind(new.main_page)
        .bind(new.available)
        .bind(actor)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update_product(
        &self,
        id: Uuid,
        new: &NewProduct,
        actor: Option<&str>,
    ) -> anyhow::Result<Option<Product>> {
        let row = sqlx::query_as::<_, Product>(
            "UPDATE products
             SET category_id = $2, name = $3, slug = $4, image = $5, model_car = $6,
                 price = $7, main_page = $8, available = $9, updated_by = $10,
                 updated = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(new.category_id)
        .bind(&new.name)
        .bind(&new.slug)
        .bind(&new.image)
        .bind(&new.model_car)
        .bind(new.price)
        .bind(new.main_page)
        .bind(new.available)
        .bind(actor)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete_product(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -- Comment operations --

    pub async fn list_comments(&self) -> anyhow::Result<Vec<Comment>> {
        let rows = sqlx::query_as::<_, Comment>("SELECT * FROM comments ORDER BY model ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn insert_comment(
        &self,
        model: &str,
        content: &str,
        author: &str,
        actor: Option<&str>,
    ) -> anyhow::Result<Comment> {
        let row = sqlx::query_as::<_, Comment>(
            "INSERT INTO comments (model, content, author, created_by, updated_by)
             VALUES ($1, $2, $3, $4, $4)
             RETURNING *",
        )
        .bind(model)
        .bind(content)
        .bind(author)
        .bind(actor)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete_comment(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -- Main-page media operations --

    /// Only media still marked available is served to the site.
    pub async fn list_main_page_media(&self) -> anyhow::Result<Vec<MainPageMedia>> {
        let rows = sqlx::query_as::<_, MainPageMedia>(
            "SELECT * FROM main_page_media WHERE available = TRUE ORDER BY created DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn insert_media(
        &self,
        image: Option<&str>,
        video: Option<&str>,
        available: bool,
        actor: Option<&str>,
    ) -> anyhow::Result<MainPageMedia> {
        let row = sqlx::query_as::<_, MainPageMedia>(
            "INSERT INTO main_page_media (image, video, available, created_by, updated_by)
             VALUES ($1, $2, $3, $4, $4)
             RETURNING *",
        )
        .bind(image)
        .bind(video)
        .bind(available)
        .bind(actor)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn update_media(
        &self,
        id: Uuid,
        image: Option<&str>,
        video: Option<&str>,
        available: bool,
        actor: Option<&str>,
    ) -> anyhow::Result<Option<MainPageMedia>> {
        let row = sqlx::query_as::<_, MainPageMedia>(
            "UPDATE main_page_media
             SET image = $2, video = $3, available = $4, updated_by = $5, updated = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(image)
        .bind(video)
        .bind(available)
        .bind(actor)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete_media(&self, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM main_page_media WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -- Contact operations --

    pub async fn insert_contact(&self, new: &NewContact) -> anyhow::Result<Contact> {
        let row = sqlx::query_as::<_, Contact>(
            "INSERT INTO contacts (first_name, last_name, mobile_phone, product_id, comment)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING *",
        )
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.mobile_phone)
        .bind(new.product_id)
        .bind(&new.comment)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn list_contacts(&self, done: Option<bool>) -> anyhow::Result<Vec<Contact>> {
        let rows = match done {
            Some(done) => {
                sqlx::query_as::<_, Contact>(
                    "SELECT * FROM contacts WHERE done = $1 ORDER BY created DESC",
                )
                .bind(done)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Contact>("SELECT * FROM contacts ORDER BY created DESC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows)
    }

    pub async fn mark_contact_done(
        &self,
        id: Uuid,
        actor: Option<&str>,
    ) -> anyhow::Result<Option<Contact>> {
        let row = sqlx::query_as::<_, Contact>(
            "UPDATE contacts SET done = TRUE, updated_by = $2, updated = NOW()
             WHERE id = $1
             RETURNING *",
        )
        .bind(id)
        .bind(actor)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

#[async_trait]
impl ServiceStore for PgStore {
    async fn find_by_token_hash(&self, token_hash: &str) -> anyhow::Result<Option<Service>> {
        let row = sqlx::query_as::<_, Service>(&format!(
            "SELECT {SERVICE_COLUMNS} FROM services WHERE token_hash = $1"
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

/// Insert/update payload for products.
#[derive(Debug)]
pub struct NewProduct {
    pub category_id: Option<Uuid>,
    pub name: String,
    pub slug: Option<String>,
    pub image: Option<String>,
    pub model_car: String,
    pub price: Decimal,
    pub main_page: bool,
    pub available: bool,
}

/// Insert payload for contact requests.
#[derive(Debug)]
pub struct NewContact {
    pub first_name: String,
    pub last_name: Option<String>,
    pub mobile_phone: String,
    pub product_id: Option<Uuid>,
    pub comment: Option<String>,
}
