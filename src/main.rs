//! keygate server - main application entry point.
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool (or enter degraded mode if allowed)
//! 3. Run database migrations
//! 4. Construct collaborators and shared state
//! 5. Build HTTP router and start serving

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use keygate::{
    app,
    config::Config,
    db,
    services::{
        notifier::{NotificationSender, WebhookNotifier},
        query_gateway::QueryLimits,
    },
    state::AppState,
    store::postgres::{PgCredentialStore, PgRelationalStore, PgUserDirectory},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Reads RUST_LOG (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    let (pool, degraded) =
        match db::create_pool(&config.database_url, config.database_max_connections).await {
            Ok(pool) => {
                tracing::info!("Database pool created");
                db::run_migrations(&pool).await?;
                tracing::info!("Database migrations complete");
                (pool, false)
            }
            Err(e) if config.degraded_start => {
                // No alternative credential source exists: every request
                // still goes to the store and fails until it is reachable.
                tracing::warn!(
                    degraded = true,
                    "Database unreachable, starting in degraded mode: {}",
                    e
                );
                let pool =
                    db::create_lazy_pool(&config.database_url, config.database_max_connections)?;
                (pool, true)
            }
            Err(e) => return Err(e.into()),
        };

    let notifier = match (&config.notify_webhook_url, &config.notify_webhook_secret) {
        (Some(url), Some(secret)) => {
            tracing::info!("Issuance notifications enabled");
            Some(Arc::new(WebhookNotifier::new(url, secret)?) as Arc<dyn NotificationSender>)
        }
        _ => None,
    };

    let state = AppState {
        credentials: Arc::new(PgCredentialStore::new(pool.clone())),
        relational: Arc::new(PgRelationalStore::new(pool.clone(), config.query_timeout())),
        users: Arc::new(PgUserDirectory::new(pool)),
        notifier,
        limits: QueryLimits {
            hard_cap: config.query_max_rows,
        },
        degraded,
    };

    let router = app::router(state);

    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, router).await?;

    Ok(())
}
