//! Lecturer Claims - API Server Binary
//!
//! This binary starts the HTTP API server for the lecturer claims workflow.
//!
//! # Usage
//!
//! ```bash
//! # In-memory store, for local development
//! cargo run --bin claims-api
//!
//! # PostgreSQL store
//! API_STORE=postgres API_DATABASE_URL=postgres://... cargo run --bin claims-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_JWT_EXPIRATION_SECS` - JWT token expiration in seconds (default: 3600)
//! * `API_STORE` - `memory` or `postgres` (default: memory)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_UPLOAD_DIR` - Directory for supporting documents (default: uploads)
//! * `API_CURRENCY` - ISO currency code for rates and invoices (default: ZAR)
//! * `API_LOG_LEVEL` - Log level or filter directive (default: info)
//! * `API_LOG_FORMAT` - `pretty` or `json` (default: pretty)

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_claims::{
    AttachmentPolicy, BroadcastNotifier, ClaimStore, InMemoryClaimStore,
    InMemoryLecturerDirectory, LecturerDirectory, WorkflowConfig, WorkflowService,
};
use infra_db::{
    create_pool, run_migrations, FileSystemBlobStore, PostgresClaimStore,
    PostgresLecturerDirectory,
};
use interface_api::config::{ApiConfig, LogFormat, StoreKind};
use interface_api::{create_router, AppState};

/// Main entry point for the API server.
///
/// Loads configuration, initializes logging, wires the workflow onto the
/// configured adapters and serves until Ctrl+C or SIGTERM.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (useful for local development)
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env().context("failed to load configuration")?;
    config.validate().context("invalid configuration")?;

    init_tracing(&config.log_level, config.log_format);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        store = ?config.store,
        "Starting Lecturer Claims API Server"
    );

    let workflow = build_workflow(&config).await?;
    let app = create_router(AppState::new(workflow, config.clone()));

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid server address {}", config.server_addr()))?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
///
/// `RUST_LOG` takes precedence over the configured level.
fn init_tracing(log_level: &str, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .init(),
    }
}

/// Builds the workflow service on the configured adapters.
async fn build_workflow(config: &ApiConfig) -> anyhow::Result<WorkflowService> {
    let (store, lecturers): (Arc<dyn ClaimStore>, Arc<dyn LecturerDirectory>) = match config.store
    {
        StoreKind::Memory => {
            tracing::warn!("Using the in-memory claim store; data is lost on restart");
            (
                Arc::new(InMemoryClaimStore::new()),
                Arc::new(InMemoryLecturerDirectory::new()),
            )
        }
        StoreKind::Postgres => {
            tracing::info!("Connecting to database...");
            let pool = create_pool(config.database())
                .await
                .context("database connection failed")?;

            tracing::info!("Running database migrations...");
            run_migrations(&pool).await.context("migrations failed")?;
            tracing::info!("Database ready");

            (
                Arc::new(PostgresClaimStore::new(pool.clone())),
                Arc::new(PostgresLecturerDirectory::new(pool)),
            )
        }
    };

    let notifier = BroadcastNotifier::new(config.notification_capacity);
    spawn_notification_log(&notifier);

    let workflow_config = WorkflowConfig {
        currency: config.currency()?,
    };
    Ok(WorkflowService::new(store, workflow_config)
        .with_blob_store(Arc::new(FileSystemBlobStore::new(
            config.upload_dir.clone(),
            AttachmentPolicy::default(),
        )))
        .with_lecturer_directory(lecturers)
        .with_notifier(Arc::new(notifier)))
}

/// Logs every claim notification until the channel closes.
fn spawn_notification_log(notifier: &BroadcastNotifier) {
    let mut receiver = notifier.subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(notification) => tracing::info!(
                    claim_id = %notification.claim_id,
                    lecturer = %notification.lecturer_id,
                    status = %notification.status,
                    "Claim status changed"
                ),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Notification log fell behind")
                }
                Err(RecvError::Closed) => break,
            }
        }
    });
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
