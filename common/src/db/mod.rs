use std::path::PathBuf;

use sqlx::{postgres::PgPoolOptions, PgPool, Pool, Postgres};
use tracing::info;

use crate::error::{Error, Result};

/// Database pool type
pub type DbPool = Pool<Postgres>;

/// Initialize the database connection pool
pub async fn init_db_pool(database_url: &str, max_connections: u32) -> Result<DbPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    info!("Connected to PostgreSQL database with pool size: {}", max_connections);
    Ok(pool)
}

/// Directory holding the workspace SQL migrations
pub fn migrations_path() -> Result<PathBuf> {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(|root| root.join("migrations"))
        .ok_or_else(|| Error::ConfigurationError("Cannot locate the migrations directory".to_string()))
}

/// Run migrations on the database
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate::Migrator::new(migrations_path()?)
        .await?
        .run(pool)
        .await?;

    info!("Database migrations applied");
    Ok(())
}
