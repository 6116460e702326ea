mod auth;
mod clock;
mod config;
mod db;
mod directory;
mod error;
mod events;
mod extractors;
mod handlers;
mod holidays;
mod middleware;
mod models;
mod openapi;
mod proofs;
mod services;
mod startup;
mod store;

use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use handlers::MetricsState;

use clock::SystemClock;
use directory::PgDirectory;
use events::{DomainEvent, EventBus};
use proofs::{FsImageStore, HsvOcrAnalyzer, TesseractCli};
use services::{Attendance, Collaborators};
use store::PgStore;

#[derive(Clone)]
pub struct AppState {
    pub attendance: Arc<Attendance>,
    pub config: AppConfig,
    pub metrics: Arc<MetricsState>,
}

/// Logs every domain event until the bus closes
fn spawn_event_logger(events: &EventBus) {
    let mut receiver = events.subscribe();
    tokio::spawn(async move {
        loop {
            match receiver.recv().await {
                Ok(DomainEvent::VerificationCompleted { person_id, date, verdict }) => {
                    tracing::info!(
                        person_id,
                        date = %date,
                        verified = verdict.is_verified(),
                        violation = verdict.is_security_violation,
                        "Verification completed"
                    );
                }
                Ok(DomainEvent::LedgerChanged { person_id, previous_used, ledger }) => {
                    tracing::info!(
                        person_id,
                        previous_used,
                        used = ledger.used,
                        remaining = ledger.remaining,
                        "Leave ledger changed"
                    );
                }
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event logger lagged behind");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing with conditional JSON/text output
    let use_json = std::env::var("LOG_FORMAT")
        .unwrap_or_else(|_| "text".to_string()) == "json";

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,attendance_axum=debug,tower_http=debug".into());

    if use_json {
        // Structured JSON logging for production
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        // Human-readable for development
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Configuration error: {}", e);
        e
    })?;

    // Create database pool
    let db = db::create_pool(&config.database_url).await.map_err(|e| {
        tracing::error!("Failed to create database pool: {}", e);
        e
    })?;

    tracing::info!("Database pool created successfully");

    if config.run_migrations {
        db::run_migrations(&db).await.map_err(|e| {
            tracing::error!("Failed to run migrations: {}", e);
            e
        })?;
        tracing::info!("Migrations applied");
    }

    // Initialize metrics recorder
    let metrics_state = Arc::new(handlers::setup_metrics_recorder()?);
    tracing::info!("Metrics recorder initialized");

    let recognizer = Arc::new(TesseractCli::new(config.tesseract_cmd.clone()));
    let attendance = Attendance::new(
        Collaborators {
            store: Arc::new(PgStore::new(db.clone())),
            directory: Arc::new(PgDirectory::new(db)),
            holidays: Arc::new(config.holidays.clone()),
            clock: Arc::new(SystemClock),
            analyzer: Arc::new(HsvOcrAnalyzer::new(recognizer, config.analysis_timeout)),
            images: Arc::new(FsImageStore::new(config.proof_storage_dir.clone())),
        },
        EventBus::default(),
        config.service_settings(),
    );
    spawn_event_logger(attendance.events());

    if config.seed_work_types {
        attendance.seed_standard_work_types().await?;
    }
    let opened = attendance.open_missing_ledgers().await?;
    tracing::info!(
        opened,
        holidays = config.holidays.len(),
        utc_offset = %config.utc_offset,
        "Attendance core ready"
    );

    let bind_addr = config.bind_addr.clone();

    // Create application state
    let state = Arc::new(AppState {
        attendance: Arc::new(attendance),
        config,
        metrics: metrics_state,
    });

    // Build router
    let app = startup::build_router(state);

    // Start server
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
