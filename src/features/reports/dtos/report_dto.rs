use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::features::moderation::models::{Sanction, ViolationType};
use crate::features::reports::models::{AdminAction, Report, ReportStatus};

/// Request DTO for reporting a user or a file
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SubmitReportDto {
    /// Set exactly one of `reported_user_id` and `reported_file_id`
    pub reported_user_id: Option<Uuid>,
    pub reported_file_id: Option<Uuid>,

    #[validate(length(min = 1, max = 1000, message = "Reason must be 1-1000 characters"))]
    pub reason: String,
}

/// Request DTO for an admin review
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct ReviewReportDto {
    /// One of `ban_user`, `delete_file`, `incorrect_report`
    #[schema(example = "ban_user")]
    pub admin_action: String,

    pub violation_type: ViolationType,

    #[validate(length(max = 1000, message = "Comment must not exceed 1000 characters"))]
    pub admin_comment: Option<String>,
}

/// Query parameters for listing reports
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListReportsQuery {
    /// Only reports in this status
    pub status: Option<ReportStatus>,
}

/// Response DTO for report
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReportResponseDto {
    pub id: Uuid,
    pub reporter_id: Uuid,
    pub reported_user_id: Option<Uuid>,
    pub reported_file_id: Option<Uuid>,
    pub reason: String,
    pub status: ReportStatus,
    pub admin_action: Option<AdminAction>,
    pub violation_type: Option<ViolationType>,
    pub admin_comment: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Report> for ReportResponseDto {
    fn from(r: Report) -> Self {
        Self {
            id: r.id,
            reporter_id: r.reporter_id,
            reported_user_id: r.reported_user_id,
            reported_file_id: r.reported_file_id,
            reason: r.reason,
            status: r.status,
            admin_action: r.admin_action,
            violation_type: r.violation_type,
            admin_comment: r.admin_comment,
            reviewed_by: r.reviewed_by,
            reviewed_at: r.reviewed_at,
            created_at: r.created_at,
        }
    }
}

/// Result of reviewing a report
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReviewOutcomeDto {
    /// `false` when the report was dismissed as incorrect
    pub valid: bool,
    pub admin_action: AdminAction,
    /// Sanction applied to the reported user or the file's owner
    pub sanction: Option<Sanction>,
    pub sanctioned_user_id: Option<Uuid>,
    pub file_removed: bool,
    pub report: ReportResponseDto,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_dto_rejects_empty_and_long_reason() {
        let empty = SubmitReportDto {
            reported_user_id: Some(Uuid::new_v4()),
            reported_file_id: None,
            reason: String::new(),
        };
        let long = SubmitReportDto {
            reason: "x".repeat(1001),
            ..empty.clone()
        };

        assert!(empty.validate().is_err());
        assert!(long.validate().is_err());
    }

    #[test]
    fn test_review_dto_keeps_unknown_action_for_service() {
        let dto: ReviewReportDto = serde_json::from_str(
            r#"{"admin_action":"suspend","violation_type":"spam"}"#,
        )
        .unwrap();

        assert_eq!(dto.admin_action, "suspend");
        assert!(dto.validate().is_ok());
    }

    #[test]
    fn test_list_query_parses_status() {
        let query: ListReportsQuery = serde_json::from_str(r#"{"status":"pending"}"#).unwrap();
        assert_eq!(query.status, Some(ReportStatus::Pending));
    }
}
