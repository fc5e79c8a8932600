//! Rating values and the aggregate derived from a book's per-user ratings.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::domain::entities::{BookRecord, BookSummary};
use crate::domain::error::DomainError;

pub const MIN_RATING: f64 = 0.0;
pub const MAX_RATING: f64 = 10.0;

/// A rating known to be finite and within `[MIN_RATING, MAX_RATING]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Rating(f64);

impl Rating {
    pub fn new(value: f64) -> Result<Self, DomainError> {
        if !value.is_finite() {
            return Err(DomainError::validation("rating must be a finite number"));
        }
        if !(MIN_RATING..=MAX_RATING).contains(&value) {
            return Err(DomainError::validation(format!(
                "rating must be between {MIN_RATING} and {MAX_RATING}, got {value}"
            )));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Rating {
    type Error = DomainError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Mean and count over a set of ratings. The mean is zero when there are none.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingAggregate {
    pub average: f64,
    pub total: i64,
}

impl RatingAggregate {
    pub fn from_ratings(ratings: &BTreeMap<String, f64>) -> Self {
        if ratings.is_empty() {
            return Self {
                average: 0.0,
                total: 0,
            };
        }

        let sum: f64 = ratings.values().sum();
        let total = ratings.len() as i64;
        Self {
            average: sum / ratings.len() as f64,
            total,
        }
    }
}

impl BookRecord {
    /// Upsert a user's rating and recompute the aggregate fields.
    ///
    /// In-memory counterpart of the single-statement update the Postgres
    /// repository performs.
    pub fn apply_rating(&mut self, user_id: &str, rating: Rating) {
        self.user_ratings.insert(user_id.to_string(), rating.value());
        let aggregate = RatingAggregate::from_ratings(&self.user_ratings);
        self.average_rating = aggregate.average;
        self.total_ratings = aggregate.total;
    }
}

/// Top-rated order: higher average first, ties by ascending id.
///
/// Must agree with `ORDER BY average_rating DESC, id ASC` in the Postgres repository.
pub fn by_rank(a: &BookSummary, b: &BookSummary) -> Ordering {
    b.rating.total_cmp(&a.rating).then(a.id.cmp(&b.id))
}
