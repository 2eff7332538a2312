use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::moderation::models::ViolationType;
use crate::shared::constants::MAX_REPORT_REASON_LEN;

/// Report status enum matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "report_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Pending,
    Reviewed,
}

impl ReportStatus {
    /// `Pending -> Reviewed`; reviewing twice is an error, not a no-op
    pub fn review(self) -> Result<ReportStatus> {
        match self {
            ReportStatus::Pending => Ok(ReportStatus::Reviewed),
            ReportStatus::Reviewed => Err(AppError::AlreadyReviewed(
                "Report has already been reviewed".to_string(),
            )),
        }
    }
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::Pending => write!(f, "pending"),
            ReportStatus::Reviewed => write!(f, "reviewed"),
        }
    }
}

/// Admin decision on a report, matching database enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type, ToSchema)]
#[sqlx(type_name = "admin_action", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AdminAction {
    BanUser,
    DeleteFile,
    IncorrectReport,
}

impl std::fmt::Display for AdminAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdminAction::BanUser => write!(f, "ban_user"),
            AdminAction::DeleteFile => write!(f, "delete_file"),
            AdminAction::IncorrectReport => write!(f, "incorrect_report"),
        }
    }
}

impl std::str::FromStr for AdminAction {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ban_user" => Ok(AdminAction::BanUser),
            "delete_file" => Ok(AdminAction::DeleteFile),
            "incorrect_report" => Ok(AdminAction::IncorrectReport),
            other => Err(AppError::InvalidAction(format!(
                "Unknown admin action '{}'",
                other
            ))),
        }
    }
}

/// Database model for report
#[derive(Debug, Clone, FromRow)]
pub struct Report {
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

/// What a report points at; exactly one of user or file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportTarget {
    User(Uuid),
    File(Uuid),
}

impl ReportTarget {
    pub fn from_parts(user_id: Option<Uuid>, file_id: Option<Uuid>) -> Result<Self> {
        match (user_id, file_id) {
            (Some(user_id), None) => Ok(ReportTarget::User(user_id)),
            (None, Some(file_id)) => Ok(ReportTarget::File(file_id)),
            (Some(_), Some(_)) => Err(AppError::InvalidTarget(
                "A report must target a user or a file, not both".to_string(),
            )),
            (None, None) => Err(AppError::InvalidTarget(
                "A report must target a user or a file".to_string(),
            )),
        }
    }
}

impl Report {
    pub fn target(&self) -> Result<ReportTarget> {
        ReportTarget::from_parts(self.reported_user_id, self.reported_file_id)
    }
}

/// Trimmed reason, non-empty and within the length limit
pub fn validate_reason(reason: &str) -> Result<String> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(AppError::Validation("Reason must not be empty".to_string()));
    }
    if reason.chars().count() as u64 > MAX_REPORT_REASON_LEN {
        return Err(AppError::Validation(format!(
            "Reason must not exceed {} characters",
            MAX_REPORT_REASON_LEN
        )));
    }

    Ok(reason.to_string())
}

/// Side effects a review will perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewPlan {
    BanUser { user_id: Uuid },
    DeleteFile { file_id: Uuid },
    Reject,
}

impl ReviewPlan {
    /// Check that `report` can still be reviewed and that `action` fits its
    /// target.
    pub fn resolve(report: &Report, action: AdminAction) -> Result<ReviewPlan> {
        report.status.review()?;

        match (action, report.target()?) {
            (AdminAction::BanUser, ReportTarget::User(user_id)) => {
                Ok(ReviewPlan::BanUser { user_id })
            }
            (AdminAction::DeleteFile, ReportTarget::File(file_id)) => {
                Ok(ReviewPlan::DeleteFile { file_id })
            }
            (AdminAction::IncorrectReport, _) => Ok(ReviewPlan::Reject),
            (AdminAction::BanUser, ReportTarget::File(_)) => Err(AppError::InvalidAction(
                "ban_user requires a report against a user".to_string(),
            )),
            (AdminAction::DeleteFile, ReportTarget::User(_)) => Err(AppError::InvalidAction(
                "delete_file requires a report against a file".to_string(),
            )),
        }
    }

    /// Whether the review records a violation
    pub fn is_sanction(&self) -> bool {
        !matches!(self, ReviewPlan::Reject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(user: Option<Uuid>, file: Option<Uuid>, status: ReportStatus) -> Report {
        Report {
            id: Uuid::new_v4(),
            reporter_id: Uuid::new_v4(),
            reported_user_id: user,
            reported_file_id: file,
            reason: "spam links".to_string(),
            status,
            admin_action: None,
            violation_type: None,
            admin_comment: None,
            reviewed_by: None,
            reviewed_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_review_is_one_way() {
        assert_eq!(ReportStatus::Pending.review().unwrap(), ReportStatus::Reviewed);
        assert!(matches!(
            ReportStatus::Reviewed.review(),
            Err(AppError::AlreadyReviewed(_))
        ));
    }

    #[test]
    fn test_admin_action_parsing() {
        assert_eq!("ban_user".parse::<AdminAction>().unwrap(), AdminAction::BanUser);
        assert_eq!(
            "incorrect_report".parse::<AdminAction>().unwrap(),
            AdminAction::IncorrectReport
        );
        assert!(matches!(
            "suspend".parse::<AdminAction>(),
            Err(AppError::InvalidAction(_))
        ));
        assert!(matches!(
            "BanUser".parse::<AdminAction>(),
            Err(AppError::InvalidAction(_))
        ));
    }

    #[test]
    fn test_target_must_be_exactly_one() {
        let id = Uuid::new_v4();
        assert_eq!(
            ReportTarget::from_parts(Some(id), None).unwrap(),
            ReportTarget::User(id)
        );
        assert_eq!(
            ReportTarget::from_parts(None, Some(id)).unwrap(),
            ReportTarget::File(id)
        );
        assert!(matches!(
            ReportTarget::from_parts(Some(id), Some(id)),
            Err(AppError::InvalidTarget(_))
        ));
        assert!(matches!(
            ReportTarget::from_parts(None, None),
            Err(AppError::InvalidTarget(_))
        ));
    }

    #[test]
    fn test_reason_validation() {
        assert_eq!(validate_reason("  spam  ").unwrap(), "spam");
        assert!(matches!(validate_reason("   "), Err(AppError::Validation(_))));
        assert!(validate_reason(&"a".repeat(1000)).is_ok());
        assert!(matches!(
            validate_reason(&"a".repeat(1001)),
            Err(AppError::Validation(_))
        ));
        // Counted in characters, not bytes
        assert!(validate_reason(&"é".repeat(1000)).is_ok());
    }

    #[test]
    fn test_plan_matches_action_to_target() {
        let user = Uuid::new_v4();
        let file = Uuid::new_v4();
        let user_report = report(Some(user), None, ReportStatus::Pending);
        let file_report = report(None, Some(file), ReportStatus::Pending);

        assert_eq!(
            ReviewPlan::resolve(&user_report, AdminAction::BanUser).unwrap(),
            ReviewPlan::BanUser { user_id: user }
        );
        assert_eq!(
            ReviewPlan::resolve(&file_report, AdminAction::DeleteFile).unwrap(),
            ReviewPlan::DeleteFile { file_id: file }
        );
        assert_eq!(
            ReviewPlan::resolve(&file_report, AdminAction::IncorrectReport).unwrap(),
            ReviewPlan::Reject
        );
        assert!(matches!(
            ReviewPlan::resolve(&file_report, AdminAction::BanUser),
            Err(AppError::InvalidAction(_))
        ));
        assert!(matches!(
            ReviewPlan::resolve(&user_report, AdminAction::DeleteFile),
            Err(AppError::InvalidAction(_))
        ));
    }

    #[test]
    fn test_reviewed_report_cannot_be_planned() {
        let reviewed = report(Some(Uuid::new_v4()), None, ReportStatus::Reviewed);
        for action in [
            AdminAction::BanUser,
            AdminAction::DeleteFile,
            AdminAction::IncorrectReport,
        ] {
            assert!(matches!(
                ReviewPlan::resolve(&reviewed, action),
                Err(AppError::AlreadyReviewed(_))
            ));
        }
    }

    #[test]
    fn test_repeated_reports_walk_the_ban_ladder() {
        use crate::features::moderation::models::Sanction;

        // Four spam reports against the same user, each reviewed with ban_user
        let target = Uuid::new_v4();
        let now = Utc::now();
        let mut prior = 0;
        let mut outcomes = Vec::new();
        for _ in 0..4 {
            let pending = report(Some(target), None, ReportStatus::Pending);
            let plan = ReviewPlan::resolve(&pending, AdminAction::BanUser).unwrap();
            assert!(plan.is_sanction());
            outcomes.push(Sanction::for_prior_violations(prior, now));
            prior += 1;
        }

        assert_eq!(outcomes[0], Sanction::Warning);
        assert_eq!(outcomes[1], Sanction::Warning);
        assert!(matches!(outcomes[2], Sanction::TemporaryBan { .. }));
        assert_eq!(outcomes[3], Sanction::PermanentBan);
    }
}
