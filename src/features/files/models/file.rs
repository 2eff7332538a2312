use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;

/// Database model for uploaded files
#[derive(Debug, Clone, FromRow)]
#[allow(dead_code)]
pub struct FileItem {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub storage_key: String,
    pub total_rating: Decimal,
    pub is_active: bool,
    pub uploaded_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}
