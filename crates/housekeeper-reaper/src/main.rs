//! Housekeeper - Periodic Cleanup Service
//!
//! This is the main entry point for the cleanup service. It runs every
//! cleanup task on its own schedule and exposes health endpoints.
//!
//! # HTTP Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /ready` - Readiness check, 503 until startup has completed

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use housekeeper_core::{ReadinessGate, SystemClock};
use housekeeper_reaper::{
    scheduler, CleanupService, Collaborators, InMemoryStreamRegistry, InMemoryWhiteboards,
    LocalFileSystem, ReaperConfig, StoreRetentionEvaluator, TaskSchedule,
};
use housekeeper_store::RocksStore;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        service: "housekeeper",
    })
}

async fn ready_handler(State(readiness): State<Arc<ReadinessGate>>) -> impl IntoResponse {
    if readiness.is_ready() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "starting")
    }
}

fn create_router(readiness: Arc<ReadinessGate>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/ready", get(ready_handler))
        .with_state(readiness)
}

async fn shutdown_signal(readiness: Arc<ReadinessGate>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    readiness.mark_not_ready();
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,housekeeper=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Housekeeper");

    // Load configuration from environment
    let listen_addr = std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/db".to_string());
    let config = ReaperConfig::from_env();
    config.validate()?;
    let schedule = TaskSchedule::from_env();
    schedule.validate()?;

    tracing::info!(
        storage_root = %config.storage_root.display(),
        recordings_dir = %config.recordings_dir.display(),
        "Loaded configuration"
    );

    // Initialize store
    let store = Arc::new(RocksStore::open(&data_dir)?);
    tracing::info!(data_dir = %data_dir, "Initialized RocksDB store");

    let readiness = Arc::new(ReadinessGate::new());
    let clock = Arc::new(SystemClock);
    let service = Arc::new(CleanupService::new(
        config,
        Collaborators {
            readiness: Arc::clone(&readiness),
            clock: clock.clone(),
            fs: Arc::new(LocalFileSystem::new()),
            whiteboards: Arc::new(InMemoryWhiteboards::new()),
            streams: Arc::new(InMemoryStreamRegistry::new()),
            sessions: store.clone(),
            users: store.clone(),
            recordings: store.clone(),
            retention: Arc::new(StoreRetentionEvaluator::new(store, clock)),
        },
    ));

    readiness.mark_ready();
    let tasks = scheduler::spawn_all(service, &schedule)?;

    // Start server
    tracing::info!(listen_addr = %listen_addr, "Starting HTTP server");
    let listener = tokio::net::TcpListener::bind(&listen_addr).await?;
    axum::serve(listener, create_router(Arc::clone(&readiness)))
        .with_graceful_shutdown(shutdown_signal(readiness))
        .await?;

    for task in tasks {
        task.abort();
    }

    Ok(())
}
