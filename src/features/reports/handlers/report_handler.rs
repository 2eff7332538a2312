use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppPath};
use crate::features::auth::guards::{RequireAdmin, RequireMember};
use crate::features::reports::dtos::{
    ListReportsQuery, ReportResponseDto, ReviewOutcomeDto, ReviewReportDto, SubmitReportDto,
};
use crate::features::reports::services::ReportService;
use crate::shared::types::{ApiResponse, Meta};

/// Report a user or a file
#[utoipa::path(
    post,
    path = "/api/reports",
    request_body = SubmitReportDto,
    responses(
        (status = 201, description = "Report submitted", body = ApiResponse<ReportResponseDto>),
        (status = 400, description = "Invalid target or reason"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is banned"),
        (status = 404, description = "Reported user or file not found")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn submit_report(
    RequireMember(user): RequireMember,
    State(service): State<Arc<ReportService>>,
    AppJson(dto): AppJson<SubmitReportDto>,
) -> Result<(StatusCode, Json<ApiResponse<ReportResponseDto>>)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let report = service.submit(user.user_id, dto).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(report.into()),
            Some("Report submitted".to_string()),
            None,
        )),
    ))
}

/// List reports, newest first (admin only)
#[utoipa::path(
    get,
    path = "/api/admin/reports",
    params(ListReportsQuery),
    responses(
        (status = 200, description = "List of reports", body = ApiResponse<Vec<ReportResponseDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn list_reports(
    _admin: RequireAdmin,
    State(service): State<Arc<ReportService>>,
    Query(query): Query<ListReportsQuery>,
) -> Result<Json<ApiResponse<Vec<ReportResponseDto>>>> {
    let reports = service.list_reports(query.status).await?;
    let dtos: Vec<ReportResponseDto> = reports.into_iter().map(Into::into).collect();
    let meta = Meta::total_of(&dtos);
    Ok(Json(ApiResponse::success(Some(dtos), None, Some(meta))))
}

/// Get report by ID (admin only)
#[utoipa::path(
    get,
    path = "/api/admin/reports/{id}",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    responses(
        (status = 200, description = "Report found", body = ApiResponse<ReportResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "Report not found")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn get_report(
    _admin: RequireAdmin,
    State(service): State<Arc<ReportService>>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<ReportResponseDto>>> {
    let report = service.get_report(id).await?;
    Ok(Json(ApiResponse::success(Some(report.into()), None, None)))
}

/// Review a pending report (admin only)
///
/// `ban_user` sanctions the reported user, `delete_file` sanctions the file's
/// owner and removes the file, `incorrect_report` dismisses the report.
#[utoipa::path(
    post,
    path = "/api/admin/reports/{id}/review",
    params(
        ("id" = Uuid, Path, description = "Report ID")
    ),
    request_body = ReviewReportDto,
    responses(
        (status = 200, description = "Report reviewed", body = ApiResponse<ReviewOutcomeDto>),
        (status = 400, description = "Unknown action, action does not fit the report, or comment too long"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required or caller is banned"),
        (status = 404, description = "Report not found"),
        (status = 409, description = "Report already reviewed")
    ),
    security(("bearer_auth" = [])),
    tag = "reports"
)]
pub async fn review_report(
    RequireAdmin(admin): RequireAdmin,
    State(service): State<Arc<ReportService>>,
    AppPath(id): AppPath<Uuid>,
    AppJson(dto): AppJson<ReviewReportDto>,
) -> Result<Json<ApiResponse<ReviewOutcomeDto>>> {
    // Payload checks run in the service, after the report state is known
    let outcome = service.review(id, admin.user_id, dto).await?;
    let message = if outcome.valid {
        "Report reviewed"
    } else {
        "Report dismissed as incorrect"
    };
    Ok(Json(ApiResponse::success(
        Some(outcome),
        Some(message.to_string()),
        None,
    )))
}
