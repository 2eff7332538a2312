use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::shared::constants::{MAX_RATING, MIN_RATING, RATING_SCALE};

/// What a rating is about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum SubjectKind {
    User,
    File,
}

impl SubjectKind {
    /// Table holding the subject and its `total_rating`
    pub(crate) fn subject_table(self) -> &'static str {
        match self {
            SubjectKind::User => "users",
            SubjectKind::File => "files",
        }
    }

    pub(crate) fn rating_table(self) -> &'static str {
        match self {
            SubjectKind::User => "user_ratings",
            SubjectKind::File => "file_ratings",
        }
    }

    /// Foreign key column in the rating table pointing at the subject
    pub(crate) fn subject_column(self) -> &'static str {
        match self {
            SubjectKind::User => "rated_user_id",
            SubjectKind::File => "file_id",
        }
    }

    /// Extra predicate that hides removed subjects
    pub(crate) fn visibility_filter(self) -> &'static str {
        match self {
            SubjectKind::User => "",
            SubjectKind::File => " AND is_active = TRUE",
        }
    }

    /// Select expression for the review text
    pub(crate) fn review_column(self) -> &'static str {
        match self {
            SubjectKind::User => "NULL::text",
            SubjectKind::File => "review",
        }
    }

    pub(crate) fn label(self) -> &'static str {
        match self {
            SubjectKind::User => "User",
            SubjectKind::File => "File",
        }
    }
}

impl std::fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubjectKind::User => write!(f, "user"),
            SubjectKind::File => write!(f, "file"),
        }
    }
}

/// A single rating, of either kind
#[derive(Debug, Clone, FromRow)]
pub struct Rating {
    pub id: Uuid,
    pub rater_id: Uuid,
    pub subject_id: Uuid,
    pub value: Decimal,
    /// Only file ratings carry a review
    pub review: Option<String>,
    pub rated_at: DateTime<Utc>,
}

/// Stored average for one subject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingAggregate {
    pub kind: SubjectKind,
    pub subject_id: Uuid,
    pub total_rating: Decimal,
    pub rating_count: i64,
}

/// Check a rating value: within [1, 5] with at most two fractional digits
pub fn validate_rating_value(value: Decimal) -> Result<Decimal> {
    if value < Decimal::from(MIN_RATING) || value > Decimal::from(MAX_RATING) {
        return Err(AppError::Validation(format!(
            "Rating must be between {} and {}",
            MIN_RATING, MAX_RATING
        )));
    }

    if value.normalize().scale() > RATING_SCALE {
        return Err(AppError::Validation(format!(
            "Rating must have at most {} decimal places",
            RATING_SCALE
        )));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::decimal;

    #[test]
    fn test_accepts_bounds_and_two_decimals() {
        for v in ["1", "5", "4.5", "3.25", "5.00", "1.10"] {
            assert!(validate_rating_value(decimal(v)).is_ok(), "{} rejected", v);
        }
    }

    #[test]
    fn test_rejects_out_of_range() {
        for v in ["0", "0.99", "5.01", "6", "-3"] {
            assert!(
                matches!(
                    validate_rating_value(decimal(v)),
                    Err(AppError::Validation(_))
                ),
                "{} accepted",
                v
            );
        }
    }

    #[test]
    fn test_rejects_three_decimals() {
        assert!(matches!(
            validate_rating_value(decimal("4.125")),
            Err(AppError::Validation(_))
        ));
        // Trailing zeros do not count
        assert!(validate_rating_value(decimal("4.500")).is_ok());
    }

    #[test]
    fn test_subject_tables() {
        assert_eq!(SubjectKind::User.rating_table(), "user_ratings");
        assert_eq!(SubjectKind::File.subject_column(), "file_id");
        assert!(SubjectKind::User.visibility_filter().is_empty());
    }
}
