use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::users::models::{User, UserRole};

/// Read access to user accounts
///
/// Accounts are provisioned by the identity provider; the moderation core only
/// looks them up and locks them.
pub struct UserService {
    pool: PgPool,
}

impl UserService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Email addresses of every admin account
    pub async fn admin_emails(&self) -> Result<Vec<String>> {
        let emails = sqlx::query_scalar::<_, String>(
            r#"
            SELECT email FROM users
            WHERE role = $1
            ORDER BY created_at
            "#,
        )
        .bind(UserRole::Admin)
        .fetch_all(&self.pool)
        .await?;

        Ok(emails)
    }

    pub async fn exists(conn: &mut PgConnection, user_id: Uuid) -> Result<bool> {
        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                .bind(user_id)
                .fetch_one(&mut *conn)
                .await?;

        Ok(exists)
    }

    /// Lock the user row for the rest of the transaction.
    ///
    /// Serializes everything that reads and then writes per-user moderation
    /// state (violation counts, bans).
    pub async fn lock(conn: &mut PgConnection, user_id: Uuid) -> Result<User> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, role, total_rating, created_at
            FROM users
            WHERE id = $1
            FOR NO KEY UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", user_id)))
    }
}
