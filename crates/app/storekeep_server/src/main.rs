//! Storekeep HTTP API server binary.
//!
//! Reads configuration from flags, environment and an optional `.env` file,
//! prepares the database, and serves the API until Ctrl-C.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use storekeep_api::config::{
    ApiConfig, ConfigError, DEFAULT_ACCESS_TOKEN_TTL_SECS, DEFAULT_REFRESH_TOKEN_TTL_SECS,
    DEFAULT_STORE_TIMEOUT_MS, token_settings,
};
use storekeep_core::store::{
    MemoryProductStore, MemoryUserStore, PgProductStore, PgUserStore, ProductStore, UserStore,
};
use tracing::{info, warn};

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "storekeep_server", about = "Storekeep HTTP API server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:8000")]
    bind: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/storekeep"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Token signing secret. Required and non-empty.
    #[arg(long, env = "JWT_SECRET", hide_env_values = true, default_value = "")]
    jwt_secret: String,

    /// Access token lifetime in seconds.
    #[arg(long, env = "ACCESS_TOKEN_TTL_SECS", default_value_t = DEFAULT_ACCESS_TOKEN_TTL_SECS)]
    access_ttl_secs: i64,

    /// Refresh token lifetime in seconds.
    #[arg(long, env = "REFRESH_TOKEN_TTL_SECS", default_value_t = DEFAULT_REFRESH_TOKEN_TTL_SECS)]
    refresh_ttl_secs: i64,

    /// Deadline for a single store call, in milliseconds.
    #[arg(long, env = "STORE_TIMEOUT_MS", default_value_t = DEFAULT_STORE_TIMEOUT_MS)]
    store_timeout_ms: u64,

    /// Mark the refresh cookie `Secure`.
    #[arg(long, env = "SECURE_COOKIES", default_value_t = false)]
    secure_cookies: bool,

    /// Keep users and products in process memory instead of PostgreSQL.
    #[arg(long, default_value_t = false)]
    memory_store: bool,
}

impl Args {
    fn api_config(&self) -> Result<ApiConfig, ConfigError> {
        ApiConfig::new(
            self.bind.clone(),
            self.database_url.clone(),
            self.jwt_secret.clone(),
            token_settings(self.access_ttl_secs, self.refresh_ttl_secs)?,
            Duration::from_millis(self.store_timeout_ms),
            self.secure_cookies,
        )
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,storekeep_api=debug,storekeep_core=debug")
            }),
        )
        .init();

    let args = Args::parse();
    let config = args.api_config()?;

    info!(
        version = storekeep_core::version(),
        bind = %config.bind_addr,
        memory_store = args.memory_store,
        "starting storekeep_server"
    );

    let (users, products): (Arc<dyn UserStore>, Arc<dyn ProductStore>) = if args.memory_store {
        warn!("using in-memory stores; data is lost on exit");
        (
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryProductStore::new()),
        )
    } else {
        info!(
            max_connections = args.max_connections,
            "configuring connection pool"
        );
        let pool = PgPoolOptions::new()
            .max_connections(args.max_connections)
            .acquire_timeout(config.store_timeout)
            .connect(&config.pg_connection_url)
            .await?;

        info!("running database migrations");
        storekeep_api::migrate(&pool).await?;

        (
            Arc::new(PgUserStore::new(pool.clone())),
            Arc::new(PgProductStore::new(pool)),
        )
    };

    let state = storekeep_api::AppState::new(config.clone(), users, products)?;
    let app = storekeep_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
