use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub redis_url: String,
    /// Key for the /admin/api surface (service issuance, catalog upkeep).
    pub admin_key: String,
    /// Mail relay endpoint for contact-request notifications.
    /// None = notifications disabled.
    pub mail_webhook_url: Option<String>,
    /// Recipient address passed to the mail relay.
    pub contact_notify_email: Option<String>,
    /// TTL in seconds for cached catalog responses (categories, products,
    /// comments). The source site refreshed these every 2 minutes.
    pub cache_ttl_secs: u64,
    /// TTL in seconds for cached main-page media responses.
    pub media_cache_ttl_secs: u64,
}

const ADMIN_KEY_PLACEHOLDER: &str = "CHANGE_ME_ADMIN_KEY";

pub fn load() -> anyhow::Result<Config> {
    dotenvy::dotenv().ok();

    let admin_key =
        std::env::var("SHOP_ADMIN_KEY").unwrap_or_else(|_| ADMIN_KEY_PLACEHOLDER.into());

    if admin_key == ADMIN_KEY_PLACEHOLDER {
        let env_mode = std::env::var("SHOP_ENV")
            .or_else(|_| std::env::var("RUST_ENV"))
            .unwrap_or_default();
        if env_mode == "production" {
            anyhow::bail!(
                "SHOP_ADMIN_KEY is still the insecure placeholder. \
                 Set a proper key before running in production."
            );
        }
        eprintln!("⚠️  SHOP_ADMIN_KEY is not set — using insecure placeholder. Set it for production.");
    }

    Ok(Config {
        port: std::env::var("SHOP_PORT")
            .unwrap_or_else(|_| "8080".into())
            .parse()
            .unwrap_or(8080),
        database_url: std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/shop".into()),
        redis_url: std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into()),
        admin_key,
        mail_webhook_url: std::env::var("SHOP_MAIL_WEBHOOK_URL").ok(),
        contact_notify_email: std::env::var("SHOP_CONTACT_NOTIFY_EMAIL").ok(),
        cache_ttl_secs: std::env::var("SHOP_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(120),
        media_cache_ttl_secs: std::env::var("SHOP_MEDIA_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1800),
    })
}
