use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::moderation::handlers::{self, ModerationState};
use crate::features::moderation::services::{BanService, ViolationService};

/// Create routes for violation/ban history and ban status
///
/// Protected routes (require auth middleware to be applied by caller)
pub fn routes(ban_service: Arc<BanService>, violation_service: Arc<ViolationService>) -> Router {
    let state = ModerationState {
        ban_service,
        violation_service,
    };

    Router::new()
        .route(
            "/api/admin/users/{id}/violations",
            get(handlers::list_violations).post(handlers::record_violation),
        )
        .route("/api/admin/users/{id}/bans", get(handlers::list_bans))
        .route("/api/me/ban-status", get(handlers::my_ban_status))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{create_member_user, lazy_pool, with_auth};
    use axum_test::TestServer;
    use uuid::Uuid;

    fn router() -> Router {
        let pool = lazy_pool();
        routes(
            Arc::new(BanService::new(pool.clone())),
            Arc::new(ViolationService::new(pool)),
        )
    }

    #[tokio::test]
    async fn test_history_requires_authentication() {
        let server = TestServer::new(router()).unwrap();

        let response = server
            .get(&format!("/api/admin/users/{}/violations", Uuid::new_v4()))
            .await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn test_history_requires_admin() {
        let server = TestServer::new(with_auth(router(), create_member_user())).unwrap();

        let violations = server
            .get(&format!("/api/admin/users/{}/violations", Uuid::new_v4()))
            .await;
        let bans = server
            .get(&format!("/api/admin/users/{}/bans", Uuid::new_v4()))
            .await;

        violations.assert_status_forbidden();
        bans.assert_status_forbidden();
    }

    #[tokio::test]
    async fn test_members_cannot_sanction() {
        let server = TestServer::new(with_auth(router(), create_member_user())).unwrap();

        let response = server
            .post(&format!("/api/admin/users/{}/violations", Uuid::new_v4()))
            .json(&serde_json::json!({ "violation_type": "spam" }))
            .await;

        response.assert_status_forbidden();
    }
}
