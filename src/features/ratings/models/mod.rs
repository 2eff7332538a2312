mod rating;

pub use rating::{validate_rating_value, Rating, RatingAggregate, SubjectKind};
