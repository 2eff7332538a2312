use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::features::moderation::models::{Ban, BanStatus, Sanction, UserViolation, ViolationType};

/// Response DTO for a violation ledger entry
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserViolationResponseDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub violation_type: ViolationType,
    pub report_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<UserViolation> for UserViolationResponseDto {
    fn from(v: UserViolation) -> Self {
        Self {
            id: v.id,
            user_id: v.user_id,
            violation_type: v.violation_type,
            report_id: v.report_id,
            created_at: v.created_at,
        }
    }
}

/// Response DTO for ban
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BanResponseDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub permanent: bool,
    pub reason: String,
}

impl From<Ban> for BanResponseDto {
    fn from(b: Ban) -> Self {
        Self {
            id: b.id,
            user_id: b.user_id,
            started_at: b.started_at,
            permanent: b.ended_at.is_none(),
            ended_at: b.ended_at,
            reason: b.reason,
        }
    }
}

/// Current ban state of the calling user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BanStatusResponseDto {
    pub user_id: Uuid,
    pub is_banned: bool,
    pub permanent: bool,
    pub banned_until: Option<DateTime<Utc>>,
}

impl BanStatusResponseDto {
    pub fn new(user_id: Uuid, status: BanStatus) -> Self {
        let (permanent, banned_until) = match status {
            BanStatus::NotBanned => (false, None),
            BanStatus::Temporary { until } => (false, Some(until)),
            BanStatus::Permanent => (true, None),
        };

        Self {
            user_id,
            is_banned: status.is_banned(),
            permanent,
            banned_until,
        }
    }
}

/// Request DTO for sanctioning a user directly
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RecordViolationDto {
    pub violation_type: ViolationType,

    #[validate(length(max = 1000, message = "Comment must not exceed 1000 characters"))]
    pub admin_comment: Option<String>,
}

/// Result of sanctioning a user
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SanctionResponseDto {
    pub user_id: Uuid,
    pub violation_type: ViolationType,
    pub sanction: Sanction,
    pub total_violations: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_ban_status_dto() {
        let user_id = Uuid::new_v4();
        let until = Utc.with_ymd_and_hms(2025, 4, 1, 0, 0, 0).unwrap();

        let dto = BanStatusResponseDto::new(user_id, BanStatus::Temporary { until });
        assert!(dto.is_banned);
        assert!(!dto.permanent);
        assert_eq!(dto.banned_until, Some(until));

        let dto = BanStatusResponseDto::new(user_id, BanStatus::Permanent);
        assert!(dto.is_banned && dto.permanent);

        let dto = BanStatusResponseDto::new(user_id, BanStatus::NotBanned);
        assert!(!dto.is_banned);
        assert_eq!(dto.banned_until, None);
    }

    #[test]
    fn test_record_violation_dto_rejects_long_comment() {
        let dto = RecordViolationDto {
            violation_type: ViolationType::Spam,
            admin_comment: Some("x".repeat(1001)),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_record_violation_dto_parses_snake_case_type() {
        let dto: RecordViolationDto =
            serde_json::from_str(r#"{"violation_type":"hate_speech"}"#).unwrap();
        assert_eq!(dto.violation_type, ViolationType::HateSpeech);
        assert!(dto.admin_comment.is_none());
    }
}
