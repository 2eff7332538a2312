use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::core::error::AppError;
use crate::features::auth::model::AuthenticatedUser;
use crate::features::moderation::services::ModerationGateway;

fn is_read_only(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Rejects mutating requests from banned users.
///
/// Must run inside `auth_middleware`, which puts the user into the request
/// extensions.
pub async fn require_not_banned(
    State(gateway): State<Arc<ModerationGateway>>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    if is_read_only(req.method()) {
        return Ok(next.run(req).await);
    }

    let user_id = req
        .extensions()
        .get::<AuthenticatedUser>()
        .map(|user| user.user_id)
        .ok_or_else(|| AppError::Unauthorized("User not authenticated".to_string()))?;

    gateway.check_not_banned(user_id).await?;

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::auth::guards::{RequireAdmin, RequireMember};
    use crate::features::moderation::services::BanService;
    use crate::shared::test_helpers::{create_member_user, lazy_pool, with_auth};
    use axum::{
        middleware,
        routing::{get, post},
        Router,
    };
    use axum_test::TestServer;
    use chrono::{Duration, Utc};
    use fake::{faker::internet::en::SafeEmail, Fake};
    use serde_json::Value;
    use sqlx::PgPool;
    use uuid::Uuid;

    fn gated_router_with(pool: PgPool) -> Router {
        let gateway = Arc::new(ModerationGateway::new(Arc::new(BanService::new(pool))));

        Router::new()
            .route("/things", get(|| async { "read" }).post(|| async { "write" }))
            .route(
                "/admin/things",
                post(|RequireAdmin(_): RequireAdmin| async { "admin write" }),
            )
            .route(
                "/member/things",
                post(|RequireMember(_): RequireMember| async { "member write" }),
            )
            .route_layer(middleware::from_fn_with_state(gateway, require_not_banned))
    }

    fn gated_router() -> Router {
        gated_router_with(lazy_pool())
    }

    async fn insert_user(pool: &PgPool) -> Uuid {
        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO users (username, email) VALUES ($1, $2) RETURNING id",
        )
        .bind(format!("u{}", (100_000..999_999).fake::<u32>()))
        .bind(SafeEmail().fake::<String>())
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn insert_ban(
        pool: &PgPool,
        user_id: Uuid,
        started_at: chrono::DateTime<Utc>,
        ended_at: Option<chrono::DateTime<Utc>>,
    ) {
        sqlx::query(
            "INSERT INTO bans (user_id, started_at, ended_at, reason) VALUES ($1, $2, $3, 'spam')",
        )
        .bind(user_id)
        .bind(started_at)
        .bind(ended_at)
        .execute(pool)
        .await
        .unwrap();
    }

    fn member(user_id: Uuid) -> crate::features::auth::model::AuthenticatedUser {
        let mut user = create_member_user();
        user.user_id = user_id;
        user
    }

    #[test]
    fn test_read_only_methods() {
        assert!(is_read_only(&Method::GET));
        assert!(is_read_only(&Method::HEAD));
        assert!(is_read_only(&Method::OPTIONS));
        assert!(!is_read_only(&Method::POST));
        assert!(!is_read_only(&Method::PUT));
        assert!(!is_read_only(&Method::DELETE));
        assert!(!is_read_only(&Method::PATCH));
    }

    #[tokio::test]
    async fn test_reads_skip_ban_lookup() {
        // The pool never connects, so reaching the handler proves no lookup ran
        let server = TestServer::new(gated_router()).unwrap();

        let response = server.get("/things").await;

        response.assert_status_ok();
        response.assert_text("read");
    }

    #[tokio::test]
    async fn test_unauthenticated_write_is_rejected() {
        let server = TestServer::new(gated_router()).unwrap();

        let response = server.post("/things").await;

        response.assert_status_unauthorized();
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_banned_user_is_refused_before_role_check(pool: PgPool) {
        let user_id = insert_user(&pool).await;
        let now = Utc::now();
        insert_ban(
            &pool,
            user_id,
            now - Duration::days(1),
            Some(now + Duration::days(29)),
        )
        .await;
        let server =
            TestServer::new(with_auth(gated_router_with(pool), member(user_id))).unwrap();

        let member_write = server.post("/member/things").await;
        let admin_write = server.post("/admin/things").await;
        let read = server.get("/things").await;

        member_write.assert_status_forbidden();
        admin_write.assert_status_forbidden();
        let body = admin_write.json::<Value>();
        assert!(body["message"].as_str().unwrap().contains("banned"));
        read.assert_status_ok();
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_permanently_banned_user_is_refused(pool: PgPool) {
        let user_id = insert_user(&pool).await;
        insert_ban(&pool, user_id, Utc::now() - Duration::days(3), None).await;
        let server =
            TestServer::new(with_auth(gated_router_with(pool), member(user_id))).unwrap();

        let response = server.post("/member/things").await;

        response.assert_status_forbidden();
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_expired_ban_lets_writes_through(pool: PgPool) {
        let user_id = insert_user(&pool).await;
        let now = Utc::now();
        insert_ban(
            &pool,
            user_id,
            now - Duration::days(40),
            Some(now - Duration::days(9)),
        )
        .await;
        let server =
            TestServer::new(with_auth(gated_router_with(pool), member(user_id))).unwrap();

        let response = server.post("/member/things").await;

        response.assert_status_ok();
        response.assert_text("member write");
    }
}
