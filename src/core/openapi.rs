use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::auth;
use crate::features::moderation::{
    dtos as moderation_dtos, handlers as moderation_handlers, models as moderation_models,
};
use crate::features::ratings::{
    dtos as ratings_dtos, handlers as ratings_handlers, models as ratings_models,
};
use crate::features::reports::{
    dtos as reports_dtos, handlers as reports_handlers, models as reports_models,
};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Ratings
        ratings_handlers::rate_user,
        ratings_handlers::update_user_rating,
        ratings_handlers::delete_user_rating,
        ratings_handlers::get_user_rating,
        ratings_handlers::rate_file,
        ratings_handlers::update_file_rating,
        ratings_handlers::delete_file_rating,
        ratings_handlers::get_file_rating,
        ratings_handlers::list_given_user_ratings,
        ratings_handlers::list_given_file_ratings,
        // Reports
        reports_handlers::submit_report,
        reports_handlers::list_reports,
        reports_handlers::get_report,
        reports_handlers::review_report,
        // Moderation
        moderation_handlers::list_violations,
        moderation_handlers::record_violation,
        moderation_handlers::list_bans,
        moderation_handlers::my_ban_status,
    ),
    components(
        schemas(
            // Shared
            Meta,
            auth::model::AuthenticatedUser,
            // Ratings
            ratings_models::SubjectKind,
            ratings_dtos::RateDto,
            ratings_dtos::RatingAggregateResponseDto,
            ratings_dtos::RatingResponseDto,
            ApiResponse<ratings_dtos::RatingAggregateResponseDto>,
            ApiResponse<Vec<ratings_dtos::RatingResponseDto>>,
            // Reports
            reports_models::ReportStatus,
            reports_models::AdminAction,
            reports_dtos::SubmitReportDto,
            reports_dtos::ReviewReportDto,
            reports_dtos::ReportResponseDto,
            reports_dtos::ReviewOutcomeDto,
            ApiResponse<reports_dtos::ReportResponseDto>,
            ApiResponse<Vec<reports_dtos::ReportResponseDto>>,
            ApiResponse<reports_dtos::ReviewOutcomeDto>,
            // Moderation
            moderation_models::ViolationType,
            moderation_models::Sanction,
            moderation_models::BanStatus,
            moderation_dtos::UserViolationResponseDto,
            moderation_dtos::BanResponseDto,
            moderation_dtos::BanStatusResponseDto,
            moderation_dtos::RecordViolationDto,
            moderation_dtos::SanctionResponseDto,
            ApiResponse<Vec<moderation_dtos::UserViolationResponseDto>>,
            ApiResponse<Vec<moderation_dtos::BanResponseDto>>,
            ApiResponse<moderation_dtos::BanStatusResponseDto>,
            ApiResponse<moderation_dtos::SanctionResponseDto>,
        )
    ),
    tags(
        (name = "ratings", description = "Star ratings for users and files"),
        (name = "reports", description = "Content reports and admin review"),
        (name = "moderation", description = "Violation history, bans and ban status"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "ShareHub API",
        version = "0.1.0",
        description = "API documentation for ShareHub moderation and reputation",
    )
)]
pub struct ApiDoc;

/// Adds Bearer JWT security scheme to OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_documents_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();

        for expected in [
            "/api/ratings/users/{user_id}",
            "/api/ratings/files/{file_id}",
            "/api/ratings/given/users",
            "/api/reports",
            "/api/admin/reports/{id}/review",
            "/api/admin/users/{id}/violations",
            "/api/admin/users/{id}/bans",
            "/api/me/ban-status",
        ] {
            assert!(
                paths.iter().any(|p| p.as_str() == expected),
                "missing path {}",
                expected
            );
        }
    }

    #[test]
    fn test_swagger_info_modifier_overrides_info() {
        let mut doc = ApiDoc::openapi();
        SwaggerInfoModifier {
            title: "Custom".to_string(),
            version: "9.9.9".to_string(),
            description: "desc".to_string(),
        }
        .modify(&mut doc);

        assert_eq!(doc.info.title, "Custom");
        assert_eq!(doc.info.version, "9.9.9");
        assert!(doc.components.is_some());
    }
}
