use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::core::database;
use crate::core::error::{map_db_error, AppError, Result};
use crate::features::ratings::models::{
    validate_rating_value, Rating, RatingAggregate, SubjectKind,
};
use crate::features::users::UserService;

/// Maintains ratings and the per-subject `total_rating` average.
///
/// Every mutation locks the subject row, changes the rating rows, then
/// recomputes the average from the table in the same transaction. This
/// service is the only writer of `total_rating`.
pub struct RatingService {
    pool: PgPool,
}

impl RatingService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn rate(
        &self,
        kind: SubjectKind,
        rater_id: Uuid,
        subject_id: Uuid,
        value: Decimal,
        review: Option<String>,
    ) -> Result<RatingAggregate> {
        let value = validate_rating_value(value)?;
        if kind == SubjectKind::User && rater_id == subject_id {
            return Err(AppError::Validation("You cannot rate yourself".to_string()));
        }

        let mut tx = database::begin(&self.pool).await?;

        Self::lock_subject(&mut tx, kind, subject_id).await?;

        if !UserService::exists(&mut tx, rater_id).await? {
            return Err(AppError::NotFound(format!("User {} not found", rater_id)));
        }

        if Self::find_rating(&mut tx, kind, rater_id, subject_id)
            .await?
            .is_some()
        {
            return Err(duplicate_rating(kind));
        }

        let insert = match kind {
            SubjectKind::User => sqlx::query(
                r#"
                INSERT INTO user_ratings (rater_id, rated_user_id, value)
                VALUES ($1, $2, $3)
                "#,
            )
            .bind(rater_id)
            .bind(subject_id)
            .bind(value),
            SubjectKind::File => sqlx::query(
                r#"
                INSERT INTO file_ratings (rater_id, file_id, value, review)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(rater_id)
            .bind(subject_id)
            .bind(value)
            .bind(review),
        };

        insert
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::from_db(e, || duplicate_rating(kind)))?;

        let aggregate = Self::recompute(&mut tx, kind, subject_id).await?;
        database::commit(tx).await?;

        info!(
            "Rating added: kind={}, subject={}, rater={}, total_rating={}",
            kind, subject_id, rater_id, aggregate.total_rating
        );

        Ok(aggregate)
    }

    /// Replace the value of an existing rating; a file review is replaced
    /// only when a new one is supplied.
    pub async fn update(
        &self,
        kind: SubjectKind,
        rater_id: Uuid,
        subject_id: Uuid,
        value: Decimal,
        review: Option<String>,
    ) -> Result<RatingAggregate> {
        let value = validate_rating_value(value)?;

        let mut tx = database::begin(&self.pool).await?;

        Self::lock_subject(&mut tx, kind, subject_id).await?;

        let existing = Self::find_rating(&mut tx, kind, rater_id, subject_id)
            .await?
            .ok_or_else(|| rating_not_found(kind, subject_id))?;

        let update = match kind {
            SubjectKind::User => {
                sqlx::query("UPDATE user_ratings SET value = $2, rated_at = NOW() WHERE id = $1")
                    .bind(existing.id)
                    .bind(value)
            }
            SubjectKind::File => sqlx::query(
                r#"
                UPDATE file_ratings
                SET value = $2, review = COALESCE($3, review), rated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(existing.id)
            .bind(value)
            .bind(review),
        };

        update.execute(&mut *tx).await.map_err(map_db_error)?;

        let aggregate = Self::recompute(&mut tx, kind, subject_id).await?;
        database::commit(tx).await?;

        info!(
            "Rating updated: kind={}, subject={}, rater={}, {} -> {}, total_rating={}",
            kind, subject_id, rater_id, existing.value, value, aggregate.total_rating
        );

        Ok(aggregate)
    }

    pub async fn delete(
        &self,
        kind: SubjectKind,
        rater_id: Uuid,
        subject_id: Uuid,
    ) -> Result<RatingAggregate> {
        let mut tx = database::begin(&self.pool).await?;

        Self::lock_subject(&mut tx, kind, subject_id).await?;

        let sql = format!(
            "DELETE FROM {} WHERE rater_id = $1 AND {} = $2 RETURNING id",
            kind.rating_table(),
            kind.subject_column()
        );
        sqlx::query_scalar::<_, Uuid>(&sql)
            .bind(rater_id)
            .bind(subject_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_db_error)?
            .ok_or_else(|| rating_not_found(kind, subject_id))?;

        let aggregate = Self::recompute(&mut tx, kind, subject_id).await?;
        database::commit(tx).await?;

        info!(
            "Rating deleted: kind={}, subject={}, rater={}, total_rating={}",
            kind, subject_id, rater_id, aggregate.total_rating
        );

        Ok(aggregate)
    }

    pub async fn get_aggregate(
        &self,
        kind: SubjectKind,
        subject_id: Uuid,
    ) -> Result<RatingAggregate> {
        let sql = format!(
            r#"
            SELECT total_rating,
                   (SELECT COUNT(*) FROM {rt} WHERE {col} = $1) AS rating_count
            FROM {st}
            WHERE id = $1{filter}
            "#,
            rt = kind.rating_table(),
            col = kind.subject_column(),
            st = kind.subject_table(),
            filter = kind.visibility_filter(),
        );

        let (total_rating, rating_count) = sqlx::query_as::<_, (Decimal, i64)>(&sql)
            .bind(subject_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| subject_not_found(kind, subject_id))?;

        Ok(RatingAggregate {
            kind,
            subject_id,
            total_rating,
            rating_count,
        })
    }

    /// Ratings of one kind given by `rater_id`, newest first
    pub async fn list_given(&self, kind: SubjectKind, rater_id: Uuid) -> Result<Vec<Rating>> {
        let sql = format!(
            r#"
            SELECT id, rater_id, {col} AS subject_id, value, {review} AS review, rated_at
            FROM {rt}
            WHERE rater_id = $1
            ORDER BY rated_at DESC
            "#,
            col = kind.subject_column(),
            review = kind.review_column(),
            rt = kind.rating_table(),
        );

        let ratings = sqlx::query_as::<_, Rating>(&sql)
            .bind(rater_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(ratings)
    }

    /// Drop every rating of a subject and reset its average, inside the
    /// caller's transaction. Used when moderation removes the subject.
    pub async fn clear_ratings(
        conn: &mut PgConnection,
        kind: SubjectKind,
        subject_id: Uuid,
    ) -> Result<RatingAggregate> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = $1",
            kind.rating_table(),
            kind.subject_column()
        );
        let removed = sqlx::query(&sql)
            .bind(subject_id)
            .execute(&mut *conn)
            .await
            .map_err(map_db_error)?
            .rows_affected();

        let aggregate = Self::recompute(conn, kind, subject_id).await?;

        info!(
            "Ratings cleared: kind={}, subject={}, removed={}",
            kind, subject_id, removed
        );

        Ok(aggregate)
    }

    async fn lock_subject(
        conn: &mut PgConnection,
        kind: SubjectKind,
        subject_id: Uuid,
    ) -> Result<()> {
        // Conflicts with other raters of this subject, not with FK KEY SHARE locks
        let sql = format!(
            "SELECT id FROM {} WHERE id = $1{} FOR NO KEY UPDATE",
            kind.subject_table(),
            kind.visibility_filter()
        );

        sqlx::query_scalar::<_, Uuid>(&sql)
            .bind(subject_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(map_db_error)?
            .ok_or_else(|| subject_not_found(kind, subject_id))?;

        Ok(())
    }

    async fn find_rating(
        conn: &mut PgConnection,
        kind: SubjectKind,
        rater_id: Uuid,
        subject_id: Uuid,
    ) -> Result<Option<Rating>> {
        let sql = format!(
            r#"
            SELECT id, rater_id, {col} AS subject_id, value, {review} AS review, rated_at
            FROM {rt}
            WHERE rater_id = $1 AND {col} = $2
            "#,
            col = kind.subject_column(),
            review = kind.review_column(),
            rt = kind.rating_table(),
        );

        let rating = sqlx::query_as::<_, Rating>(&sql)
            .bind(rater_id)
            .bind(subject_id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(rating)
    }

    /// Recompute `total_rating` from the rating table, in one statement
    async fn recompute(
        conn: &mut PgConnection,
        kind: SubjectKind,
        subject_id: Uuid,
    ) -> Result<RatingAggregate> {
        let sql = format!(
            r#"
            WITH stats AS (
                SELECT COUNT(*) AS rating_count, ROUND(AVG(value), 2) AS average
                FROM {rt}
                WHERE {col} = $1
            )
            UPDATE {st}
            SET total_rating = COALESCE(stats.average, 0)
            FROM stats
            WHERE {st}.id = $1
            RETURNING {st}.total_rating, stats.rating_count
            "#,
            rt = kind.rating_table(),
            col = kind.subject_column(),
            st = kind.subject_table(),
        );

        let (total_rating, rating_count) = sqlx::query_as::<_, (Decimal, i64)>(&sql)
            .bind(subject_id)
            .fetch_optional(&mut *conn)
            .await
            .map_err(map_db_error)?
            .ok_or_else(|| subject_not_found(kind, subject_id))?;

        Ok(RatingAggregate {
            kind,
            subject_id,
            total_rating,
            rating_count,
        })
    }
}

fn subject_not_found(kind: SubjectKind, subject_id: Uuid) -> AppError {
    AppError::NotFound(format!("{} {} not found", kind.label(), subject_id))
}

fn rating_not_found(kind: SubjectKind, subject_id: Uuid) -> AppError {
    AppError::RatingNotFound(format!("You have not rated {} {}", kind, subject_id))
}

fn duplicate_rating(kind: SubjectKind) -> AppError {
    AppError::DuplicateRating(format!("You have already rated this {}", kind))
}
