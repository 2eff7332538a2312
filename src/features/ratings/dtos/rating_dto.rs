use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::features::ratings::models::{
    validate_rating_value, Rating, RatingAggregate, SubjectKind,
};

fn rating_value(value: &Decimal) -> Result<(), ValidationError> {
    validate_rating_value(*value).map(|_| ()).map_err(|_| {
        ValidationError::new("rating_value")
            .with_message("Rating must be between 1 and 5 with at most 2 decimals".into())
    })
}

/// Request DTO for adding or changing a rating
///
/// `review` is only stored for file ratings.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RateDto {
    #[validate(custom(function = "rating_value"))]
    #[schema(value_type = String, example = "4.5")]
    pub value: Decimal,

    #[validate(length(max = 2000, message = "Review must not exceed 2000 characters"))]
    pub review: Option<String>,
}

/// Response DTO for a subject's stored average
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RatingAggregateResponseDto {
    pub subject_kind: SubjectKind,
    pub subject_id: Uuid,
    #[schema(value_type = String, example = "4.50")]
    pub total_rating: Decimal,
    pub rating_count: i64,
}

impl From<RatingAggregate> for RatingAggregateResponseDto {
    fn from(a: RatingAggregate) -> Self {
        Self {
            subject_kind: a.kind,
            subject_id: a.subject_id,
            total_rating: a.total_rating,
            rating_count: a.rating_count,
        }
    }
}

/// Response DTO for a rating the caller gave
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RatingResponseDto {
    pub id: Uuid,
    pub subject_id: Uuid,
    #[schema(value_type = String, example = "4.00")]
    pub value: Decimal,
    pub review: Option<String>,
    pub rated_at: DateTime<Utc>,
}

impl From<Rating> for RatingResponseDto {
    fn from(r: Rating) -> Self {
        Self {
            id: r.id,
            subject_id: r.subject_id,
            value: r.value,
            review: r.review,
            rated_at: r.rated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::test_helpers::decimal;

    #[test]
    fn test_rate_dto_accepts_number_or_string() {
        let from_number: RateDto = serde_json::from_str(r#"{"value": 4.5}"#).unwrap();
        let from_string: RateDto = serde_json::from_str(r#"{"value": "4.5"}"#).unwrap();

        assert_eq!(from_number.value, decimal("4.5"));
        assert_eq!(from_string.value, decimal("4.5"));
        assert!(from_number.validate().is_ok());
    }

    #[test]
    fn test_rate_dto_validation() {
        let too_high = RateDto {
            value: decimal("5.5"),
            review: None,
        };
        let too_precise = RateDto {
            value: decimal("3.333"),
            review: None,
        };
        let long_review = RateDto {
            value: decimal("3"),
            review: Some("r".repeat(2001)),
        };

        assert!(too_high.validate().is_err());
        assert!(too_precise.validate().is_err());
        assert!(long_review.validate().is_err());
    }

    #[test]
    fn test_aggregate_dto_from_model() {
        let subject_id = Uuid::new_v4();
        let dto = RatingAggregateResponseDto::from(RatingAggregate {
            kind: SubjectKind::File,
            subject_id,
            total_rating: decimal("4.50"),
            rating_count: 2,
        });

        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["subject_kind"], "file");
        assert_eq!(json["total_rating"], "4.50");
        assert_eq!(json["rating_count"], 2);
    }
}
