use crate::core::config::DatabaseConfig;
use crate::core::error::{map_db_error, Result};
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use std::time::Duration;

pub type PgTransaction<'a> = Transaction<'a, Postgres>;

pub async fn create_pool(config: &DatabaseConfig) -> std::result::Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(config.max_lifetime_secs))
        .connect(&config.url)
        .await
}

/// Open a read-committed transaction.
///
/// Dropping the returned transaction without `commit` rolls it back.
pub async fn begin(pool: &PgPool) -> Result<PgTransaction<'static>> {
    pool.begin().await.map_err(|e| {
        tracing::error!("Failed to begin transaction: {:?}", e);
        map_db_error(e)
    })
}

/// Commit, classifying serialization failures as concurrency conflicts
pub async fn commit(tx: PgTransaction<'_>) -> Result<()> {
    tx.commit().await.map_err(map_db_error)
}
