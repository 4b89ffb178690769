//! Tasklane - Task management API with session-based authentication

use anyhow::{Context, Result};
use axum::http::{HeaderValue, Method, header};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::Config;
use tasklane_api::{AppState, create_router};
use tasklane_auth::{SessionManager, TokenCodec};
use tasklane_db::Database;

/// Tasklane - Task management API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "TASKLANE_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "TASKLANE_PORT")]
    port: Option<u16>,

    /// Secret used to sign access tokens
    #[arg(long, env = "TASKLANE_ACCESS_TOKEN_SECRET", hide_env_values = true)]
    access_token_secret: Option<String>,

    /// Secret used to sign refresh tokens
    #[arg(long, env = "TASKLANE_REFRESH_TOKEN_SECRET", hide_env_values = true)]
    refresh_token_secret: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(&args.config)?;
    config.override_secrets(args.access_token_secret, args.refresh_token_secret);

    init_logging(&config.logging.level, &config.logging.format);

    info!("Starting Tasklane v{}", env!("CARGO_PKG_VERSION"));

    config.validate()?;
    config.warn_insecure_defaults();

    // Create the database directory
    if let Some(parent) = Path::new(&config.database.path).parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create database directory {:?}", parent))?;
    }

    let db_url = format!("sqlite:{}?mode=rwc", config.database.path);
    let db = Database::new(&db_url)
        .await
        .context("Failed to open database")?;

    let tokens = Arc::new(TokenCodec::new(&config.auth.token_config()));
    let sessions = Arc::new(SessionManager::new(Arc::new(db.clone()), tokens.clone()));

    let state = AppState::new(db, sessions, tokens, config.auth.cookie_settings());

    let metrics_handle = if config.metrics.enabled {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        Some(Arc::new(handle))
    } else {
        None
    };

    let cors = cors_layer(&config.cors.allowed_origin)?;

    let app = create_router(state, metrics_handle)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", bind_addr, port))?;

    info!("Listening on {}", addr);
    info!("Allowed origin: {}", config.cors.allowed_origin);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    if format == "json" {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// CORS for the single browser origin; credentials are allowed so the
/// refresh cookie is sent cross-origin
fn cors_layer(origin: &str) -> Result<CorsLayer> {
    let origin = HeaderValue::from_str(origin)
        .with_context(|| format!("Invalid CORS origin: {}", origin))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]))
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
