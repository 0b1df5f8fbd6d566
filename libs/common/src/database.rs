//! Database module for handling PostgreSQL connections and operations
//!
//! This module provides connection pooling, migrations, and health checks
//! for the PostgreSQL database.

use crate::error::{DatabaseError, DatabaseResult};
use crate::settings::DatabaseConfig;
use sqlx::migrate::Migrator;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::path::Path;
use std::time::Duration;
use tracing::{error, info};

/// Initialize a PostgreSQL connection pool
///
/// # Arguments
///
/// * `config` - Database configuration
///
/// # Returns
///
/// * `DatabaseResult<PgPool>` - PostgreSQL connection pool or error
pub async fn init_pool(config: &DatabaseConfig) -> DatabaseResult<PgPool> {
    info!("Initializing database connection pool");

    let pool = pool_options(config)
        .connect(&config.url)
        .await
        .map_err(DatabaseError::Connection)?;

    info!("Database connection pool initialized successfully");
    Ok(pool)
}

/// Build a pool that connects on first use
///
/// Used where a pool must exist before the database is reachable.
pub fn lazy_pool(config: &DatabaseConfig) -> DatabaseResult<PgPool> {
    pool_options(config)
        .connect_lazy(&config.url)
        .map_err(|e| DatabaseError::Configuration(format!("Invalid database URL: {}", e)))
}

fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
}

/// Apply pending SQL migrations from `dir`
pub async fn run_migrations(pool: &PgPool, dir: &str) -> DatabaseResult<()> {
    let migrator = Migrator::new(Path::new(dir))
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;

    migrator
        .run(pool)
        .await
        .map_err(|e| DatabaseError::Migration(e.to_string()))?;

    info!("Database migrations applied from {}", dir);
    Ok(())
}

/// Check database connectivity
///
/// # Arguments
///
/// * `pool` - PostgreSQL connection pool
///
/// # Returns
///
/// * `DatabaseResult<bool>` - True if connection is successful, false otherwise
pub async fn health_check(pool: &PgPool) -> DatabaseResult<bool> {
    match sqlx::query("SELECT 1").execute(pool).await {
        Ok(_) => Ok(true),
        Err(e) => {
            error!("Database health check failed: {}", e);
            Ok(false)
        }
    }
}
