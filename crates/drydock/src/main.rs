//! Drydock - Self-hosted file storage portal with a mechanic marketplace

use anyhow::{Result, bail};
use clap::Parser;
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use config::Config;
use drydock_api::{AppState, MetricsHandle, create_router};
use drydock_auth::TokenService;
use drydock_db::Database;
use drydock_mail::{Mailer, MailerConfig};
use drydock_storage::{LocalStorage, S3Config, S3Storage, StorageBackend};

/// Drydock - file storage portal and mechanic marketplace server
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml")]
    config: String,

    /// Bind address
    #[arg(long, env = "DRYDOCK_BIND")]
    bind: Option<String>,

    /// Port
    #[arg(short, long, env = "DRYDOCK_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load configuration
    let config = Config::load(&args.config)?;

    // Initialize logging
    init_logging(&config.logging.level);

    info!("Starting Drydock v{}", env!("CARGO_PKG_VERSION"));

    // Create data directories
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    // Initialize database
    let db_path = format!("sqlite:{}?mode=rwc", config.database.path);
    let db = Database::new(&db_path).await?;

    // Create default admin user if no users exist
    if !db.has_users().await? {
        info!("Creating default admin user");
        let password_hash = drydock_auth::hash_password("admin")?;
        db.insert_user(drydock_db::NewUser {
            username: "admin".to_string(),
            name: "Administrator".to_string(),
            password_hash,
            role: drydock_db::UserRole::Admin,
        })
        .await?;
        info!("Default admin user created (username: admin, password: admin)");
    }

    // Initialize storage backend
    let storage: Arc<dyn StorageBackend> = match config.storage.backend.as_str() {
        "local" => Arc::new(
            LocalStorage::new(
                &config.storage.local.path,
                config.storage.local.public_base_url.clone(),
            )
            .await?,
        ),
        "s3" => {
            let s3 = &config.storage.s3;
            let Some(bucket) = s3.bucket.clone() else {
                bail!("S3 backend selected but no bucket configured");
            };
            let Some(public_base_url) = s3.public_base_url.clone() else {
                bail!("S3 backend selected but no public_base_url configured");
            };
            Arc::new(
                S3Storage::new(S3Config {
                    bucket,
                    region: s3.region.clone().unwrap_or_else(|| "us-east-1".to_string()),
                    endpoint: s3.endpoint.clone(),
                    access_key_id: s3.access_key.clone(),
                    secret_access_key: s3.secret_key.clone(),
                    prefix: s3.prefix.clone(),
                    public_base_url,
                    allow_http: s3.allow_http,
                })
                .await?,
            )
        }
        other => bail!("Unknown storage backend: {}", other),
    };

    // Initialize token service
    let tokens = Arc::new(TokenService::new(
        &config.auth.jwt_secret,
        config.auth.session_ttl_hours,
    ));

    // Initialize mail client
    let mailer = Arc::new(Mailer::new(MailerConfig {
        api_base: config.mail.api_base.clone(),
        api_key: config.mail.api_key.clone(),
        from: config.mail.from.clone(),
        enabled: config.mail.enabled,
    })?);

    // Install Prometheus recorder
    let metrics_handle = PrometheusBuilder::new()
        .install_recorder()
        .map(|handle| Arc::new(MetricsHandle::new(handle)))
        .ok();

    // Create application state
    let state = AppState::new(
        db,
        storage,
        tokens,
        mailer,
        config.auth.cookie_secure,
        config.server.app_base_url.clone(),
    );

    // Create router
    let app = create_router(state, metrics_handle).layer(TraceLayer::new_for_http());

    // Determine bind address
    let bind_addr = args.bind.unwrap_or(config.server.bind_address);
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", bind_addr, port).parse()?;

    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Initialize logging
fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install CTRL+C handler");
    info!("Shutdown signal received");
}
