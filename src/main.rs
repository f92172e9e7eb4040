use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tower_http::cors::CorsLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

mod api;
mod auth;
mod cache;
mod cli;
mod config;
mod errors;
mod middleware;
mod models;
mod notification;
mod store;

use cache::TieredCache;
use notification::email::EmailNotifier;
use store::postgres::PgStore;

/// Shared application state passed to handlers and middleware.
pub struct AppState {
    pub db: PgStore,
    pub cache: TieredCache,
    pub notifier: EmailNotifier,
    pub config: config::Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "shop_api=debug,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    match args.command {
        Some(cli::Commands::Serve { port }) => run_server(cfg, port).await,
        Some(cli::Commands::Service { command }) => {
            let db = PgStore::connect(&cfg.database_url)
                .await
                .context("failed to connect to Postgres")?;
            db.migrate().await?;
            handle_service_command(&db, command).await
        }
        None => run_server(cfg, None).await,
    }
}

async fn run_server(cfg: config::Config, port_override: Option<u16>) -> anyhow::Result<()> {
    let port = port_override.unwrap_or(cfg.port);

    let db = PgStore::connect(&cfg.database_url)
        .await
        .context("failed to connect to Postgres")?;
    db.migrate().await?;

    let redis_client = redis::Client::open(cfg.redis_url.as_str())?;
    let redis_conn = redis::aio::ConnectionManager::new(redis_client)
        .await
        .context("failed to connect to Redis")?;
    let cache = TieredCache::new(redis_conn);

    let notifier = EmailNotifier::new(
        cfg.mail_webhook_url.clone(),
        cfg.contact_notify_email.clone(),
    );

    let state = Arc::new(AppState {
        db,
        cache,
        notifier,
        config: cfg,
    });

    // Sweep locally-expired response cache entries once a minute.
    {
        let cache = state.cache.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(60));
            loop {
                interval.tick().await;
                let evicted = cache.evict_expired();
                if evicted > 0 {
                    tracing::debug!(evicted, "swept expired response cache entries");
                }
            }
        });
    }

    let app = axum::Router::new()
        .nest("/api", api::api_router(state.clone()))
        .nest("/admin/api", api::admin_router(state.clone()))
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn handle_service_command(
    db: &PgStore,
    command: cli::ServiceCommands,
) -> anyhow::Result<()> {
    match command {
        cli::ServiceCommands::Create { name, actor } => {
            let token = auth::token::generate_token();
            let service = db
                .insert_service(&name, &auth::token::hash_token(&token), actor.as_deref())
                .await?;
            println!(
                "Service created:\n  ID:   {}\n  Name: {}\n  Use:  Authorization: Bearer {}",
                service.id, service.name, token
            );
            println!("Store the token now: it is not shown again.");
        }
        cli::ServiceCommands::Rotate { service_id, actor } => {
            let id = Uuid::parse_str(&service_id).context("invalid service id")?;
            let token = auth::token::generate_token();
            let service = db
                .rotate_service_token(id, &auth::token::hash_token(&token), actor.as_deref())
                .await?;
            println!(
                "Token rotated for '{}' ({}).\n  Use:  Authorization: Bearer {}",
                service.name, service.id, token
            );
            println!("The previous token no longer authenticates.");
        }
        cli::ServiceCommands::List => {
            let services = db.list_services().await?;
            if services.is_empty() {
                println!("No services registered.");
            }
            for service in services {
                println!(
                    "{}  {}  (created by {})",
                    service.id,
                    service.name,
                    service.created_by.as_deref().unwrap_or("-")
                );
            }
        }
        cli::ServiceCommands::Delete { service_id } => {
            let id = Uuid::parse_str(&service_id).context("invalid service id")?;
            db.delete_service(id).await?;
            println!("Service {} deleted.", id);
        }
    }
    Ok(())
}
