mod config;
mod db;
mod embedding;
mod errors;
mod extraction;
mod lifecycle;
mod llm_client;
mod models;
mod routes;
mod scoring;
mod state;
mod storage;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_store;
use crate::extraction::DocumentExtractor;
use crate::lifecycle::ModelHandles;
use crate::routes::build_router;
use crate::scoring::batch::BatchCoordinator;
use crate::scoring::orchestrator::ResumeScorer;
use crate::scoring::similarity::SimilarityEstimator;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on malformed values)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http=info",
                env!("CARGO_CRATE_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume screener v{}", env!("CARGO_PKG_VERSION"));

    // Embedding model + feedback client, shared by every request
    let models = ModelHandles::init(&config).await?;

    // Result store (Postgres, or disabled)
    let store = create_store(config.database_url.as_deref()).await?;

    let scorer = ResumeScorer::new(
        SimilarityEstimator::new(Arc::clone(&models.embedder)),
        Arc::clone(&models.feedback),
        config.verdict_policy,
    );
    let coordinator = BatchCoordinator::new(Arc::new(scorer), store, config.batch_concurrency);
    info!(
        skills = config.vocabulary.len(),
        concurrency = coordinator.concurrency(),
        "Scoring pipeline ready"
    );

    let port = config.port;
    let state = AppState {
        coordinator: Arc::new(coordinator),
        text_source: Arc::new(DocumentExtractor),
        config: Arc::new(config),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the frontend host is fixed

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router (and its clones of the model handles) is gone once serve returns.
    models.shutdown();
    info!("Shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}
