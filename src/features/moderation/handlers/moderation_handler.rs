use std::sync::Arc;

use axum::{extract::State, Json};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppPath};
use crate::features::auth::guards::{RequireAdmin, RequireMember};
use crate::features::moderation::dtos::{
    BanResponseDto, BanStatusResponseDto, RecordViolationDto, SanctionResponseDto,
    UserViolationResponseDto,
};
use crate::features::moderation::services::{BanService, ViolationService};
use crate::shared::types::{ApiResponse, Meta};

/// State for moderation handlers
#[derive(Clone)]
pub struct ModerationState {
    pub ban_service: Arc<BanService>,
    pub violation_service: Arc<ViolationService>,
}

/// Violation history of a user (admin only)
#[utoipa::path(
    get,
    path = "/api/admin/users/{id}/violations",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Violation history, newest first", body = ApiResponse<Vec<UserViolationResponseDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "moderation"
)]
pub async fn list_violations(
    _admin: RequireAdmin,
    State(state): State<ModerationState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<Vec<UserViolationResponseDto>>>> {
    let violations = state.violation_service.list_violations(id).await?;
    let dtos: Vec<UserViolationResponseDto> = violations.into_iter().map(Into::into).collect();
    let meta = Meta::total_of(&dtos);
    Ok(Json(ApiResponse::success(Some(dtos), None, Some(meta))))
}

/// Record a violation against a user and apply the escalation ladder (admin only)
#[utoipa::path(
    post,
    path = "/api/admin/users/{id}/violations",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    request_body = RecordViolationDto,
    responses(
        (status = 200, description = "Violation recorded", body = ApiResponse<SanctionResponseDto>),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required or caller is banned"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "moderation"
)]
pub async fn record_violation(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<ModerationState>,
    AppPath(id): AppPath<Uuid>,
    AppJson(dto): AppJson<RecordViolationDto>,
) -> Result<Json<ApiResponse<SanctionResponseDto>>> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let sanction = state
        .ban_service
        .ban_user_for_violation(id, dto.violation_type, dto.admin_comment.as_deref())
        .await?;
    let total_violations = state.violation_service.count_violations(id).await?;

    tracing::info!(
        "Admin {} recorded {} violation against {}",
        admin.user_id,
        dto.violation_type,
        id
    );

    let response = SanctionResponseDto {
        user_id: id,
        violation_type: dto.violation_type,
        sanction,
        total_violations,
    };
    Ok(Json(ApiResponse::success(
        Some(response),
        Some("Violation recorded".to_string()),
        None,
    )))
}

/// Ban history of a user (admin only)
#[utoipa::path(
    get,
    path = "/api/admin/users/{id}/bans",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Ban history, newest first", body = ApiResponse<Vec<BanResponseDto>>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin access required"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "moderation"
)]
pub async fn list_bans(
    _admin: RequireAdmin,
    State(state): State<ModerationState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ApiResponse<Vec<BanResponseDto>>>> {
    let bans = state.ban_service.list_bans(id).await?;
    let dtos: Vec<BanResponseDto> = bans.into_iter().map(Into::into).collect();
    let meta = Meta::total_of(&dtos);
    Ok(Json(ApiResponse::success(Some(dtos), None, Some(meta))))
}

/// Ban status of the authenticated user
#[utoipa::path(
    get,
    path = "/api/me/ban-status",
    responses(
        (status = 200, description = "Current ban status", body = ApiResponse<BanStatusResponseDto>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "moderation"
)]
pub async fn my_ban_status(
    RequireMember(user): RequireMember,
    State(state): State<ModerationState>,
) -> Result<Json<ApiResponse<BanStatusResponseDto>>> {
    let status = state.ban_service.ban_status(user.user_id).await?;
    Ok(Json(ApiResponse::success(
        Some(BanStatusResponseDto::new(user.user_id, status)),
        None,
        None,
    )))
}
