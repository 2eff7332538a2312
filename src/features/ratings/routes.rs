use std::sync::Arc;

use axum::{routing::get, Router};

use crate::features::ratings::handlers;
use crate::features::ratings::services::RatingService;

/// Create routes for the ratings feature
///
/// Protected routes (require auth middleware to be applied by caller)
pub fn routes(rating_service: Arc<RatingService>) -> Router {
    Router::new()
        .route(
            "/api/ratings/users/{user_id}",
            get(handlers::get_user_rating)
                .post(handlers::rate_user)
                .put(handlers::update_user_rating)
                .delete(handlers::delete_user_rating),
        )
        .route(
            "/api/ratings/files/{file_id}",
            get(handlers::get_file_rating)
                .post(handlers::rate_file)
                .put(handlers::update_file_rating)
                .delete(handlers::delete_file_rating),
        )
        .route(
            "/api/ratings/given/users",
            get(handlers::list_given_user_ratings),
        )
        .route(
            "/api/ratings/given/files",
            get(handlers::list_given_file_ratings),
        )
        .with_state(rating_service)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::{
        create_member_user, create_user_with_roles, lazy_pool, with_auth,
    };
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use uuid::Uuid;

    fn router() -> Router {
        routes(Arc::new(RatingService::new(lazy_pool())))
    }

    #[tokio::test]
    async fn test_requires_authentication() {
        let server = TestServer::new(router()).unwrap();

        let response = server
            .post(&format!("/api/ratings/files/{}", Uuid::new_v4()))
            .json(&json!({ "value": 4 }))
            .await;

        response.assert_status_unauthorized();
    }

    #[tokio::test]
    async fn test_requires_member_role() {
        let server = TestServer::new(with_auth(router(), create_user_with_roles(&[]))).unwrap();

        let response = server
            .get(&format!("/api/ratings/users/{}", Uuid::new_v4()))
            .await;

        response.assert_status_forbidden();
    }

    #[tokio::test]
    async fn test_self_rating_is_bad_request() {
        let member = create_member_user();
        let own_id = member.user_id;
        let server = TestServer::new(with_auth(router(), member)).unwrap();

        let response = server
            .post(&format!("/api/ratings/users/{}", own_id))
            .json(&json!({ "value": "5" }))
            .await;

        response.assert_status_bad_request();
        let body: Value = response.json();
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_out_of_range_value_is_bad_request() {
        let server = TestServer::new(with_auth(router(), create_member_user())).unwrap();

        let response = server
            .put(&format!("/api/ratings/files/{}", Uuid::new_v4()))
            .json(&json!({ "value": 7 }))
            .await;

        response.assert_status_bad_request();
    }

    #[tokio::test]
    async fn test_malformed_id_is_bad_request() {
        let server = TestServer::new(with_auth(router(), create_member_user())).unwrap();

        let response = server.delete("/api/ratings/files/not-a-uuid").await;

        response.assert_status_bad_request();
    }
}
