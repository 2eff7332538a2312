use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::database;
use crate::core::error::{map_db_error, AppError, Result};
use crate::features::moderation::models::{Ban, BanStatus, Sanction, ViolationType};
use crate::features::moderation::services::ViolationService;
use crate::features::users::UserService;

/// Decides and records bans from a user's violation history
pub struct BanService {
    pool: PgPool,
}

impl BanService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a violation and apply the resulting sanction in its own
    /// transaction.
    pub async fn ban_user_for_violation(
        &self,
        user_id: Uuid,
        violation_type: ViolationType,
        admin_comment: Option<&str>,
    ) -> Result<Sanction> {
        let mut tx = database::begin(&self.pool).await?;
        let sanction =
            Self::apply_violation(&mut tx, user_id, violation_type, admin_comment, None).await?;
        database::commit(tx).await?;

        Ok(sanction)
    }

    /// Record a violation and apply the resulting sanction inside the
    /// caller's transaction.
    ///
    /// Locks the user row first so concurrent sanctions against the same user
    /// see each other's violations.
    pub async fn apply_violation(
        conn: &mut PgConnection,
        user_id: Uuid,
        violation_type: ViolationType,
        admin_comment: Option<&str>,
        report_id: Option<Uuid>,
    ) -> Result<Sanction> {
        UserService::lock(conn, user_id).await?;

        let prior = ViolationService::count_in(conn, user_id).await?;
        ViolationService::record_violation(conn, user_id, violation_type, report_id).await?;

        let now = Utc::now();
        let sanction = Sanction::for_prior_violations(prior, now);

        if let Some(ended_at) = sanction.ban_end() {
            let reason = admin_comment
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| format!("Repeated violations: {}", violation_type));

            sqlx::query(
                r#"
                INSERT INTO bans (user_id, started_at, ended_at, reason)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(user_id)
            .bind(now)
            .bind(ended_at)
            .bind(&reason)
            .execute(&mut *conn)
            .await
            .map_err(map_db_error)?;
        }

        info!(
            "Sanction applied: user={}, prior_violations={}, sanction={:?}",
            user_id, prior, sanction
        );

        Ok(sanction)
    }

    async fn latest_ban(&self, user_id: Uuid) -> Result<Option<Ban>> {
        let ban = sqlx::query_as::<_, Ban>(
            r#"
            SELECT id, user_id, started_at, ended_at, reason, created_at
            FROM bans
            WHERE user_id = $1
            ORDER BY started_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(ban)
    }

    pub async fn ban_status(&self, user_id: Uuid) -> Result<BanStatus> {
        let latest = self.latest_ban(user_id).await?;
        Ok(BanStatus::derive(latest.as_ref(), Utc::now()))
    }

    pub async fn is_banned(&self, user_id: Uuid) -> Result<bool> {
        let banned = self.ban_status(user_id).await?.is_banned();
        debug!("Ban check: user={}, banned={}", user_id, banned);
        Ok(banned)
    }

    /// Ban history for one user, newest first
    pub async fn list_bans(&self, user_id: Uuid) -> Result<Vec<Ban>> {
        let mut conn = self.pool.acquire().await?;
        if !UserService::exists(&mut conn, user_id).await? {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }

        let bans = sqlx::query_as::<_, Ban>(
            r#"
            SELECT id, user_id, started_at, ended_at, reason, created_at
            FROM bans
            WHERE user_id = $1
            ORDER BY started_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(bans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::moderation::services::ViolationService;
    use fake::{faker::internet::en::SafeEmail, Fake};

    async fn insert_user(pool: &PgPool) -> Uuid {
        let username = format!("u{}", (100_000..999_999).fake::<u32>());
        sqlx::query_scalar::<_, Uuid>(
            "INSERT INTO users (username, email) VALUES ($1, $2) RETURNING id",
        )
        .bind(username)
        .bind(SafeEmail().fake::<String>())
        .fetch_one(pool)
        .await
        .unwrap()
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_ladder_escalates_on_third_and_fourth_violation(pool: PgPool) {
        let user_id = insert_user(&pool).await;
        let bans = BanService::new(pool.clone());
        let violations = ViolationService::new(pool.clone());

        let first = bans
            .ban_user_for_violation(user_id, ViolationType::Spam, None)
            .await
            .unwrap();
        let second = bans
            .ban_user_for_violation(user_id, ViolationType::Spam, None)
            .await
            .unwrap();
        assert_eq!(first, Sanction::Warning);
        assert_eq!(second, Sanction::Warning);
        assert!(!bans.is_banned(user_id).await.unwrap());

        let third = bans
            .ban_user_for_violation(user_id, ViolationType::Spam, Some("third strike"))
            .await
            .unwrap();
        assert!(matches!(third, Sanction::TemporaryBan { .. }));
        assert!(bans.is_banned(user_id).await.unwrap());

        let fourth = bans
            .ban_user_for_violation(user_id, ViolationType::Spam, None)
            .await
            .unwrap();
        assert_eq!(fourth, Sanction::PermanentBan);
        assert_eq!(bans.ban_status(user_id).await.unwrap(), BanStatus::Permanent);

        assert_eq!(violations.count_violations(user_id).await.unwrap(), 4);
        let history = bans.list_bans(user_id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].ended_at, None);
        assert_eq!(history[1].reason, "third strike");
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_unknown_user_is_not_found(pool: PgPool) {
        let bans = BanService::new(pool);

        let result = bans
            .ban_user_for_violation(Uuid::new_v4(), ViolationType::Other, None)
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_expired_ban_is_not_active(pool: PgPool) {
        let user_id = insert_user(&pool).await;
        sqlx::query(
            r#"
            INSERT INTO bans (user_id, started_at, ended_at, reason)
            VALUES ($1, NOW() - INTERVAL '2 months', NOW() - INTERVAL '1 month', 'old')
            "#,
        )
        .bind(user_id)
        .execute(&pool)
        .await
        .unwrap();

        let bans = BanService::new(pool);

        assert!(!bans.is_banned(user_id).await.unwrap());
    }

    #[sqlx::test(migrations = "./migrations")]
    #[ignore = "requires DATABASE_URL"]
    async fn test_concurrent_sanctions_serialize_on_user_row(pool: PgPool) {
        let user_id = insert_user(&pool).await;
        let bans = std::sync::Arc::new(BanService::new(pool.clone()));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let bans = bans.clone();
                tokio::spawn(async move {
                    bans.ban_user_for_violation(user_id, ViolationType::Harassment, None)
                        .await
                })
            })
            .collect();

        let mut outcomes = Vec::new();
        for handle in handles {
            outcomes.push(handle.await.unwrap().unwrap());
        }

        let warnings = outcomes.iter().filter(|s| **s == Sanction::Warning).count();
        let temporary = outcomes
            .iter()
            .filter(|s| matches!(s, Sanction::TemporaryBan { .. }))
            .count();
        let permanent = outcomes
            .iter()
            .filter(|s| **s == Sanction::PermanentBan)
            .count();
        assert_eq!((warnings, temporary, permanent), (2, 1, 1));
    }
}
