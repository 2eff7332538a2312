use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use uuid::Uuid;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::core::extractor::{AppJson, AppPath};
use crate::features::auth::guards::RequireMember;
use crate::features::ratings::dtos::{RateDto, RatingAggregateResponseDto, RatingResponseDto};
use crate::features::ratings::models::SubjectKind;
use crate::features::ratings::services::RatingService;
use crate::shared::types::{ApiResponse, Meta};

type AggregateResponse = Json<ApiResponse<RatingAggregateResponseDto>>;

async fn rate_subject(
    service: &RatingService,
    kind: SubjectKind,
    rater_id: Uuid,
    subject_id: Uuid,
    dto: RateDto,
) -> Result<(StatusCode, AggregateResponse)> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let aggregate = service
        .rate(kind, rater_id, subject_id, dto.value, dto.review)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            Some(aggregate.into()),
            Some("Rating added".to_string()),
            None,
        )),
    ))
}

async fn update_subject(
    service: &RatingService,
    kind: SubjectKind,
    rater_id: Uuid,
    subject_id: Uuid,
    dto: RateDto,
) -> Result<AggregateResponse> {
    dto.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let aggregate = service
        .update(kind, rater_id, subject_id, dto.value, dto.review)
        .await?;
    Ok(Json(ApiResponse::success(
        Some(aggregate.into()),
        Some("Rating updated".to_string()),
        None,
    )))
}

async fn delete_subject(
    service: &RatingService,
    kind: SubjectKind,
    rater_id: Uuid,
    subject_id: Uuid,
) -> Result<AggregateResponse> {
    let aggregate = service.delete(kind, rater_id, subject_id).await?;
    Ok(Json(ApiResponse::success(
        Some(aggregate.into()),
        Some("Rating deleted".to_string()),
        None,
    )))
}

async fn list_given(
    service: &RatingService,
    kind: SubjectKind,
    rater_id: Uuid,
) -> Result<Json<ApiResponse<Vec<RatingResponseDto>>>> {
    let ratings = service.list_given(kind, rater_id).await?;
    let dtos: Vec<RatingResponseDto> = ratings.into_iter().map(Into::into).collect();
    let meta = Meta::total_of(&dtos);
    Ok(Json(ApiResponse::success(Some(dtos), None, Some(meta))))
}

/// Rate another user
#[utoipa::path(
    post,
    path = "/api/ratings/users/{user_id}",
    params(("user_id" = Uuid, Path, description = "Rated user ID")),
    request_body = RateDto,
    responses(
        (status = 201, description = "Rating added, new average returned", body = ApiResponse<RatingAggregateResponseDto>),
        (status = 400, description = "Invalid value or self-rating"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is banned"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Already rated")
    ),
    security(("bearer_auth" = [])),
    tag = "ratings"
)]
pub async fn rate_user(
    RequireMember(user): RequireMember,
    State(service): State<Arc<RatingService>>,
    AppPath(user_id): AppPath<Uuid>,
    AppJson(dto): AppJson<RateDto>,
) -> Result<(StatusCode, AggregateResponse)> {
    rate_subject(&service, SubjectKind::User, user.user_id, user_id, dto).await
}

/// Change the rating you gave a user
#[utoipa::path(
    put,
    path = "/api/ratings/users/{user_id}",
    params(("user_id" = Uuid, Path, description = "Rated user ID")),
    request_body = RateDto,
    responses(
        (status = 200, description = "Rating updated", body = ApiResponse<RatingAggregateResponseDto>),
        (status = 400, description = "Invalid value"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User or rating not found")
    ),
    security(("bearer_auth" = [])),
    tag = "ratings"
)]
pub async fn update_user_rating(
    RequireMember(user): RequireMember,
    State(service): State<Arc<RatingService>>,
    AppPath(user_id): AppPath<Uuid>,
    AppJson(dto): AppJson<RateDto>,
) -> Result<AggregateResponse> {
    update_subject(&service, SubjectKind::User, user.user_id, user_id, dto).await
}

/// Withdraw the rating you gave a user
#[utoipa::path(
    delete,
    path = "/api/ratings/users/{user_id}",
    params(("user_id" = Uuid, Path, description = "Rated user ID")),
    responses(
        (status = 200, description = "Rating deleted", body = ApiResponse<RatingAggregateResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User or rating not found")
    ),
    security(("bearer_auth" = [])),
    tag = "ratings"
)]
pub async fn delete_user_rating(
    RequireMember(user): RequireMember,
    State(service): State<Arc<RatingService>>,
    AppPath(user_id): AppPath<Uuid>,
) -> Result<AggregateResponse> {
    delete_subject(&service, SubjectKind::User, user.user_id, user_id).await
}

/// Average rating of a user
#[utoipa::path(
    get,
    path = "/api/ratings/users/{user_id}",
    params(("user_id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Stored average", body = ApiResponse<RatingAggregateResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "ratings"
)]
pub async fn get_user_rating(
    _member: RequireMember,
    State(service): State<Arc<RatingService>>,
    AppPath(user_id): AppPath<Uuid>,
) -> Result<AggregateResponse> {
    let aggregate = service.get_aggregate(SubjectKind::User, user_id).await?;
    Ok(Json(ApiResponse::success(Some(aggregate.into()), None, None)))
}

/// Rate a file
#[utoipa::path(
    post,
    path = "/api/ratings/files/{file_id}",
    params(("file_id" = Uuid, Path, description = "File ID")),
    request_body = RateDto,
    responses(
        (status = 201, description = "Rating added, new average returned", body = ApiResponse<RatingAggregateResponseDto>),
        (status = 400, description = "Invalid value"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Caller is banned"),
        (status = 404, description = "File not found"),
        (status = 409, description = "Already rated")
    ),
    security(("bearer_auth" = [])),
    tag = "ratings"
)]
pub async fn rate_file(
    RequireMember(user): RequireMember,
    State(service): State<Arc<RatingService>>,
    AppPath(file_id): AppPath<Uuid>,
    AppJson(dto): AppJson<RateDto>,
) -> Result<(StatusCode, AggregateResponse)> {
    rate_subject(&service, SubjectKind::File, user.user_id, file_id, dto).await
}

/// Change the rating (and optionally the review) you gave a file
#[utoipa::path(
    put,
    path = "/api/ratings/files/{file_id}",
    params(("file_id" = Uuid, Path, description = "File ID")),
    request_body = RateDto,
    responses(
        (status = 200, description = "Rating updated", body = ApiResponse<RatingAggregateResponseDto>),
        (status = 400, description = "Invalid value"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File or rating not found")
    ),
    security(("bearer_auth" = [])),
    tag = "ratings"
)]
pub async fn update_file_rating(
    RequireMember(user): RequireMember,
    State(service): State<Arc<RatingService>>,
    AppPath(file_id): AppPath<Uuid>,
    AppJson(dto): AppJson<RateDto>,
) -> Result<AggregateResponse> {
    update_subject(&service, SubjectKind::File, user.user_id, file_id, dto).await
}

/// Withdraw the rating you gave a file
#[utoipa::path(
    delete,
    path = "/api/ratings/files/{file_id}",
    params(("file_id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 200, description = "Rating deleted", body = ApiResponse<RatingAggregateResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File or rating not found")
    ),
    security(("bearer_auth" = [])),
    tag = "ratings"
)]
pub async fn delete_file_rating(
    RequireMember(user): RequireMember,
    State(service): State<Arc<RatingService>>,
    AppPath(file_id): AppPath<Uuid>,
) -> Result<AggregateResponse> {
    delete_subject(&service, SubjectKind::File, user.user_id, file_id).await
}

/// Average rating of a file
#[utoipa::path(
    get,
    path = "/api/ratings/files/{file_id}",
    params(("file_id" = Uuid, Path, description = "File ID")),
    responses(
        (status = 200, description = "Stored average", body = ApiResponse<RatingAggregateResponseDto>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "File not found")
    ),
    security(("bearer_auth" = [])),
    tag = "ratings"
)]
pub async fn get_file_rating(
    _member: RequireMember,
    State(service): State<Arc<RatingService>>,
    AppPath(file_id): AppPath<Uuid>,
) -> Result<AggregateResponse> {
    let aggregate = service.get_aggregate(SubjectKind::File, file_id).await?;
    Ok(Json(ApiResponse::success(Some(aggregate.into()), None, None)))
}

/// User ratings the caller has given
#[utoipa::path(
    get,
    path = "/api/ratings/given/users",
    responses(
        (status = 200, description = "Ratings given, newest first", body = ApiResponse<Vec<RatingResponseDto>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "ratings"
)]
pub async fn list_given_user_ratings(
    RequireMember(user): RequireMember,
    State(service): State<Arc<RatingService>>,
) -> Result<Json<ApiResponse<Vec<RatingResponseDto>>>> {
    list_given(&service, SubjectKind::User, user.user_id).await
}

/// File ratings the caller has given
#[utoipa::path(
    get,
    path = "/api/ratings/given/files",
    responses(
        (status = 200, description = "Ratings given, newest first", body = ApiResponse<Vec<RatingResponseDto>>),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "ratings"
)]
pub async fn list_given_file_ratings(
    RequireMember(user): RequireMember,
    State(service): State<Arc<RatingService>>,
) -> Result<Json<ApiResponse<Vec<RatingResponseDto>>>> {
    list_given(&service, SubjectKind::File, user.user_id).await
}
