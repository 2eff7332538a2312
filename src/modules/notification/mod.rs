//! Outbound notifications
//!
//! Delivery is best-effort: callers log a failed `send` and move on.

mod email_client;

use async_trait::async_trait;

use crate::core::error::AppError;

pub use email_client::{EmailClient, LogNotifier};

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), AppError>;
}
