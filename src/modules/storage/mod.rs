//! Storage module for uploaded content
//!
//! `FileStorage` is the seam the moderation workflow removes objects through;
//! `MinIOClient` is the S3-compatible implementation.

mod minio_client;

use async_trait::async_trait;

use crate::core::error::AppError;

pub use minio_client::MinIOClient;

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Remove the object stored under `key`.
    ///
    /// Returns `Ok(false)` when the object did not exist.
    async fn delete(&self, key: &str) -> Result<bool, AppError>;
}
