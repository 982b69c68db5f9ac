use anyhow::{bail, Context, Result};
use sqlx::{postgres::{PgConnectOptions, PgPoolOptions}, PgPool};
use tracing::{info, warn};
use std::str::FromStr;

use crate::config::DatabaseConfig;

pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(config: &DatabaseConfig) -> Result<Self> {
        info!("Connecting to PostgreSQL database");

        let database_url = config.require_url()?;

        let connect_options = PgConnectOptions::from_str(database_url)
            .context("Failed to parse DATABASE_URL")?
            // pooled endpoints (pgBouncer) reject named prepared statements
            .statement_cache_capacity(0);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(std::time::Duration::from_secs(10))
            .idle_timeout(std::time::Duration::from_secs(300))
            .max_lifetime(std::time::Duration::from_secs(1800))
            .connect_with(connect_options)
            .await
            .context("Failed to connect to PostgreSQL database. Check that DATABASE_URL is set correctly and the server is reachable.")?;

        info!("Database connection established successfully");
        Ok(Database { pool })
    }

    /// Run database migrations
    pub async fn run_migrations(&self) -> Result<()> {
        info!("Running database migrations");

        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;

        info!("Database migrations completed successfully");
        Ok(())
    }

    /// Perform a health check on the database connection
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .persistent(false)
            .fetch_one(&self.pool)
            .await
            .context("Database health check failed")?;

        info!("Database health check passed");
        Ok(())
    }

    /// True once the newsletter tables exist
    pub async fn schema_ready(&self) -> Result<bool> {
        let ready: bool = sqlx::query_scalar(
            "SELECT to_regclass('public.newsletters') IS NOT NULL \
               AND to_regclass('public.newsletter_analysis') IS NOT NULL \
               AND to_regclass('public.optimized_newsletters') IS NOT NULL",
        )
        .persistent(false)
        .fetch_one(&self.pool)
        .await
        .context("Failed to inspect newsletter tables")?;

        Ok(ready)
    }

    /// Connect and refuse to continue until migrations have been applied
    pub async fn connect_ready(config: &DatabaseConfig) -> Result<Self> {
        let db = Self::new(config).await?;
        if !db.schema_ready().await? {
            warn!("Newsletter tables are missing");
            db.close().await;
            bail!("Newsletter tables not found, run `newsletter migrate` first");
        }
        Ok(db)
    }

    /// Close the database connection pool
    pub async fn close(self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }
}
