use futures::stream::{self, StreamExt};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use crate::core::database;
use crate::core::error::{map_db_error, AppError, Result};
use crate::features::files::FileService;
use crate::features::moderation::BanService;
use crate::features::ratings::models::SubjectKind;
use crate::features::ratings::RatingService;
use crate::features::reports::dtos::{ReviewOutcomeDto, ReviewReportDto, SubmitReportDto};
use crate::features::reports::models::{
    validate_reason, AdminAction, Report, ReportStatus, ReportTarget, ReviewPlan,
};
use crate::features::users::UserService;
use crate::modules::notification::Notifier;
use crate::shared::constants::MAX_CONCURRENT_NOTIFICATIONS;

const REPORT_COLUMNS: &str = "id, reporter_id, reported_user_id, reported_file_id, reason, \
    status, admin_action, violation_type, admin_comment, reviewed_by, reviewed_at, created_at";

/// Report submission and admin review
pub struct ReportService {
    pool: PgPool,
    user_service: Arc<UserService>,
    file_service: Arc<FileService>,
    notifier: Arc<dyn Notifier>,
}

impl ReportService {
    pub fn new(
        pool: PgPool,
        user_service: Arc<UserService>,
        file_service: Arc<FileService>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            pool,
            user_service,
            file_service,
            notifier,
        }
    }

    /// Store a pending report, then tell the admins about it
    pub async fn submit(&self, reporter_id: Uuid, dto: SubmitReportDto) -> Result<Report> {
        let target = ReportTarget::from_parts(dto.reported_user_id, dto.reported_file_id)?;
        let reason = validate_reason(&dto.reason)?;

        if target == ReportTarget::User(reporter_id) {
            return Err(AppError::InvalidTarget(
                "You cannot report yourself".to_string(),
            ));
        }

        {
            let mut conn = self.pool.acquire().await?;
            if !UserService::exists(&mut conn, reporter_id).await? {
                return Err(AppError::NotFound(format!(
                    "User {} not found",
                    reporter_id
                )));
            }
            if let ReportTarget::User(user_id) = target {
                if !UserService::exists(&mut conn, user_id).await? {
                    return Err(AppError::NotFound(format!("User {} not found", user_id)));
                }
            }
        }

        if let ReportTarget::File(file_id) = target {
            if !self.file_service.exists_active(file_id).await? {
                return Err(AppError::NotFound(format!("File {} not found", file_id)));
            }
        }

        let sql = format!(
            r#"
            INSERT INTO reports (reporter_id, reported_user_id, reported_file_id, reason)
            VALUES ($1, $2, $3, $4)
            RETURNING {}
            "#,
            REPORT_COLUMNS
        );
        let report = sqlx::query_as::<_, Report>(&sql)
            .bind(reporter_id)
            .bind(dto.reported_user_id)
            .bind(dto.reported_file_id)
            .bind(&reason)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        info!(
            "Report submitted: id={}, reporter={}, target={:?}",
            report.id, reporter_id, target
        );

        self.notify_admins(&report).await;

        Ok(report)
    }

    /// Apply an admin decision to a pending report.
    ///
    /// The report row stays locked for the whole review. A missing report is
    /// `NotFound` and a reviewed one is `AlreadyReviewed` whatever the payload;
    /// the action and comment are only checked after that. Any failure rolls
    /// back every side effect and leaves the report pending.
    pub async fn review(
        &self,
        report_id: Uuid,
        admin_id: Uuid,
        dto: ReviewReportDto,
    ) -> Result<ReviewOutcomeDto> {
        let mut tx = database::begin(&self.pool).await?;

        let sql = format!("SELECT {} FROM reports WHERE id = $1 FOR UPDATE", REPORT_COLUMNS);
        let report = sqlx::query_as::<_, Report>(&sql)
            .bind(report_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_db_error)?
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", report_id)))?;

        let status = report.status.review()?;

        let action: AdminAction = dto.admin_action.trim().parse()?;
        dto.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        let violation_type = dto.violation_type;
        let admin_comment = dto
            .admin_comment
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        let plan = ReviewPlan::resolve(&report, action)?;

        let mut sanction = None;
        let mut sanctioned_user_id = None;
        let mut removed_object = None;

        match plan {
            ReviewPlan::BanUser { user_id } => {
                sanction = Some(
                    BanService::apply_violation(
                        &mut tx,
                        user_id,
                        violation_type,
                        admin_comment,
                        Some(report.id),
                    )
                    .await?,
                );
                sanctioned_user_id = Some(user_id);
            }
            ReviewPlan::DeleteFile { file_id } => {
                let file = FileService::lock_active(&mut tx, file_id)
                    .await
                    .map_err(|e| match e {
                        AppError::NotFound(_) => AppError::InvalidAction(format!(
                            "File {} has already been removed",
                            file_id
                        )),
                        other => other,
                    })?;

                sanction = Some(
                    BanService::apply_violation(
                        &mut tx,
                        file.owner_id,
                        violation_type,
                        admin_comment,
                        Some(report.id),
                    )
                    .await?,
                );
                sanctioned_user_id = Some(file.owner_id);

                RatingService::clear_ratings(&mut tx, SubjectKind::File, file_id).await?;
                FileService::soft_delete(&mut tx, file_id).await?;
                removed_object = Some(file.storage_key);
            }
            ReviewPlan::Reject => {}
        }

        let sql = format!(
            r#"
            UPDATE reports
            SET status = $2,
                admin_action = $3,
                violation_type = $4,
                admin_comment = $5,
                reviewed_by = $6,
                reviewed_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            REPORT_COLUMNS
        );
        let reviewed = sqlx::query_as::<_, Report>(&sql)
            .bind(report.id)
            .bind(status)
            .bind(action)
            .bind(plan.is_sanction().then_some(violation_type))
            .bind(admin_comment)
            .bind(admin_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_error)?;

        database::commit(tx).await?;

        info!(
            "Report reviewed: id={}, admin={}, action={}, sanction={:?}",
            reviewed.id, admin_id, action, sanction
        );

        let file_removed = removed_object.is_some();
        if let Some(storage_key) = removed_object {
            self.file_service.purge_object(&storage_key).await;
        }

        Ok(ReviewOutcomeDto {
            valid: plan.is_sanction(),
            admin_action: action,
            sanction,
            sanctioned_user_id,
            file_removed,
            report: reviewed.into(),
        })
    }

    /// Reports newest first, optionally filtered by status
    pub async fn list_reports(&self, status: Option<ReportStatus>) -> Result<Vec<Report>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM reports
            WHERE ($1::report_status IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#,
            REPORT_COLUMNS
        );

        let reports = sqlx::query_as::<_, Report>(&sql)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;

        Ok(reports)
    }

    pub async fn get_report(&self, report_id: Uuid) -> Result<Report> {
        let sql = format!("SELECT {} FROM reports WHERE id = $1", REPORT_COLUMNS);

        sqlx::query_as::<_, Report>(&sql)
            .bind(report_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Report {} not found", report_id)))
    }

    /// Best-effort: failures are logged and never reach the reporter.
    ///
    /// Sends run concurrently, so submit waits roughly one email timeout
    /// per `MAX_CONCURRENT_NOTIFICATIONS` admins.
    async fn notify_admins(&self, report: &Report) {
        let admins = match self.user_service.admin_emails().await {
            Ok(admins) => admins,
            Err(e) => {
                warn!("Failed to load admin emails for report {}: {}", report.id, e);
                return;
            }
        };

        let subject = "New report submitted";
        let body = report_notification_body(report);

        stream::iter(admins)
            .for_each_concurrent(MAX_CONCURRENT_NOTIFICATIONS, |email| {
                let body = &body;
                async move {
                    if let Err(e) = self.notifier.send(&email, subject, body).await {
                        warn!(
                            "Failed to notify admin {} about report {}: {}",
                            email, report.id, e
                        );
                    }
                }
            })
            .await;
    }
}

fn report_notification_body(report: &Report) -> String {
    let target = match (report.reported_user_id, report.reported_file_id) {
        (Some(user_id), _) => format!("user {}", user_id),
        (_, Some(file_id)) => format!("file {}", file_id),
        _ => "unknown target".to_string(),
    };

    format!(
        "<p>A new report is waiting for review.</p>\
         <p><strong>Report:</strong> {}<br><strong>Target:</strong> {}<br>\
         <strong>Reason:</strong> {}</p>",
        report.id,
        target,
        escape_html(&report.reason)
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
