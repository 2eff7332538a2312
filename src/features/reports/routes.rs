use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::features::reports::handlers;
use crate::features::reports::services::ReportService;

/// Create routes for the reports feature
///
/// Protected routes (require auth middleware to be applied by caller)
pub fn routes(report_service: Arc<ReportService>) -> Router {
    Router::new()
        .route("/api/reports", post(handlers::submit_report))
        .route("/api/admin/reports", get(handlers::list_reports))
        .route("/api/admin/reports/{id}", get(handlers::get_report))
        .route(
            "/api/admin/reports/{id}/review",
            post(handlers::review_report),
        )
        .with_state(report_service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::files::FileService;
    use crate::features::users::UserService;
    use crate::shared::test_helpers::{
        create_member_user, lazy_pool, with_admin_auth, with_auth, RecordingNotifier,
        RecordingStorage,
    };
    use axum_test::TestServer;
    use serde_json::json;
    use uuid::Uuid;

    fn router() -> Router {
        let pool = lazy_pool();
        routes(Arc::new(ReportService::new(
            pool.clone(),
            Arc::new(UserService::new(pool.clone())),
            Arc::new(FileService::new(
                pool.clone(),
                Arc::new(RecordingStorage::default()),
            )),
            Arc::new(RecordingNotifier::default()),
        )))
    }

    #[tokio::test]
    async fn test_submit_requires_authentication() {
        let server = TestServer::new(router()).unwrap();

        let response = server
            .post("/api/reports")
            .json(&json!({ "reported_user_id": Uuid::new_v4(), "reason": "spam" }))
            .await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn test_submit_with_two_targets_is_bad_request() {
        let server = TestServer::new(with_auth(router(), create_member_user())).unwrap();

        let response = server
            .post("/api/reports")
            .json(&json!({
                "reported_user_id": Uuid::new_v4(),
                "reported_file_id": Uuid::new_v4(),
                "reason": "spam"
            }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_admin_routes_reject_members() {
        let server = TestServer::new(with_auth(router(), create_member_user())).unwrap();
        let id = Uuid::new_v4();

        server.get("/api/admin/reports").await.assert_status_forbidden();
        server
            .get(&format!("/api/admin/reports/{}", id))
            .await
            .assert_status_forbidden();
        server
            .post(&format!("/api/admin/reports/{}/review", id))
            .json(&json!({ "admin_action": "ban_user", "violation_type": "spam" }))
            .await
            .assert_status_forbidden();
    }

    #[tokio::test]
    async fn test_malformed_report_id_is_bad_request() {
        let server = TestServer::new(with_admin_auth(router())).unwrap();

        let response = server
            .post("/api/admin/reports/not-a-uuid/review")
            .json(&json!({ "admin_action": "ban_user", "violation_type": "spam" }))
            .await;

        response.assert_status_bad_request();
    }
}
