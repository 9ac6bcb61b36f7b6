use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

use crate::storage::{DisabledStore, PgResultStore, ResultStore};

/// Connects to PostgreSQL and prepares the result tables.
/// Without a `DATABASE_URL`, results are served but never stored.
pub async fn create_store(database_url: Option<&str>) -> Result<Arc<dyn ResultStore>> {
    let Some(database_url) = database_url else {
        warn!("DATABASE_URL not set; analysis results will not be persisted");
        return Ok(Arc::new(DisabledStore));
    };

    info!("Connecting to PostgreSQL...");

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .context("Failed to connect to PostgreSQL")?;

    info!("PostgreSQL connection pool established");

    let store = PgResultStore::new(pool);
    store
        .ensure_schema()
        .await
        .context("Failed to create result tables")?;
    Ok(Arc::new(store))
}
