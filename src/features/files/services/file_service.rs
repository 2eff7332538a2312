use sqlx::{PgConnection, PgPool};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::core::error::{map_db_error, AppError, Result};
use crate::features::files::models::FileItem;
use crate::modules::storage::FileStorage;

/// Service for file operations used by moderation
pub struct FileService {
    pool: PgPool,
    storage: Arc<dyn FileStorage>,
}

impl FileService {
    pub fn new(pool: PgPool, storage: Arc<dyn FileStorage>) -> Self {
        Self { pool, storage }
    }

    /// Whether an active (not removed) file exists
    pub async fn exists_active(&self, file_id: Uuid) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM files WHERE id = $1 AND is_active = TRUE)",
        )
        .bind(file_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Lock an active file row for the rest of the transaction
    pub async fn lock_active(conn: &mut PgConnection, file_id: Uuid) -> Result<FileItem> {
        sqlx::query_as::<_, FileItem>(
            r#"
            SELECT * FROM files
            WHERE id = $1 AND is_active = TRUE
            FOR NO KEY UPDATE
            "#,
        )
        .bind(file_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("File {} not found", file_id)))
    }

    /// Mark a file as removed.
    ///
    /// The row stays because reports keep referencing it. Ratings are cleared
    /// separately by the rating aggregator in the same transaction.
    pub async fn soft_delete(conn: &mut PgConnection, file_id: Uuid) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE files
            SET is_active = FALSE, deleted_at = NOW()
            WHERE id = $1 AND is_active = TRUE
            "#,
        )
        .bind(file_id)
        .execute(&mut *conn)
        .await
        .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("File {} not found", file_id)));
        }

        info!("File soft deleted: id={}", file_id);
        Ok(())
    }

    /// Remove the stored object once the removal has committed.
    ///
    /// Failures are logged only; the file is already unreachable.
    pub async fn purge_object(&self, storage_key: &str) {
        match self.storage.delete(storage_key).await {
            Ok(true) => debug!("Stored object removed: {}", storage_key),
            Ok(false) => debug!("Stored object already absent: {}", storage_key),
            Err(e) => warn!("Failed to remove stored object {}: {}", storage_key, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{lazy_pool, RecordingStorage};

    #[tokio::test]
    async fn test_purge_object_deletes_key() {
        let storage = Arc::new(RecordingStorage::default());
        let service = FileService::new(lazy_pool(), storage.clone());

        service.purge_object("uploads/a.pdf").await;

        assert_eq!(*storage.deleted.lock().unwrap(), vec!["uploads/a.pdf"]);
    }

    #[tokio::test]
    async fn test_purge_object_swallows_storage_errors() {
        let storage = Arc::new(RecordingStorage {
            fail: true,
            ..Default::default()
        });
        let service = FileService::new(lazy_pool(), storage.clone());

        service.purge_object("uploads/a.pdf").await;

        assert!(storage.deleted.lock().unwrap().is_empty());
    }
}
