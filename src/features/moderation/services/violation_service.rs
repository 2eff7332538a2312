use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::core::error::{map_db_error, AppError, Result};
use crate::features::moderation::models::{UserViolation, ViolationType};
use crate::features::users::UserService;

/// Append-only violation ledger
pub struct ViolationService {
    pool: PgPool,
}

impl ViolationService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append a violation inside the caller's transaction
    pub async fn record_violation(
        conn: &mut PgConnection,
        user_id: Uuid,
        violation_type: ViolationType,
        report_id: Option<Uuid>,
    ) -> Result<UserViolation> {
        let violation = sqlx::query_as::<_, UserViolation>(
            r#"
            INSERT INTO user_violations (user_id, violation_type, report_id)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, violation_type, report_id, created_at
            "#,
        )
        .bind(user_id)
        .bind(violation_type)
        .bind(report_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| match map_db_error(e) {
            AppError::NotFound(_) => AppError::NotFound(format!("User {} not found", user_id)),
            other => other,
        })?;

        info!(
            "Violation recorded: user={}, type={}, report={:?}",
            user_id, violation_type, report_id
        );

        Ok(violation)
    }

    pub async fn count_in(conn: &mut PgConnection, user_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM user_violations WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

        Ok(count)
    }

    pub async fn count_violations(&self, user_id: Uuid) -> Result<i64> {
        let mut conn = self.pool.acquire().await?;
        Self::count_in(&mut conn, user_id).await
    }

    /// Full history for one user, newest first
    pub async fn list_violations(&self, user_id: Uuid) -> Result<Vec<UserViolation>> {
        let mut conn = self.pool.acquire().await?;
        if !UserService::exists(&mut conn, user_id).await? {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        let violations = sqlx::query_as::<_, UserViolation>(
            r#"
            SELECT id, user_id, violation_type, report_id, created_at
            FROM user_violations
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(violations)
    }
}
