use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

/// Violation type enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "violation_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    Spam,
    Harassment,
    HateSpeech,
    Copyright,
    InappropriateContent,
    Other,
}

impl std::fmt::Display for ViolationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViolationType::Spam => write!(f, "spam"),
            ViolationType::Harassment => write!(f, "harassment"),
            ViolationType::HateSpeech => write!(f, "hate_speech"),
            ViolationType::Copyright => write!(f, "copyright"),
            ViolationType::InappropriateContent => write!(f, "inappropriate_content"),
            ViolationType::Other => write!(f, "other"),
        }
    }
}

/// Database model for an entry in the violation ledger.
///
/// Rows are append-only.
#[derive(Debug, Clone, FromRow)]
pub struct UserViolation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub violation_type: ViolationType,
    pub report_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}
