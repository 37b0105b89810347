use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::error::AppError;

/// Star rating in half-star steps between 0.5 and 5.0
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Rating(f64);

impl Rating {
    pub const MIN: f64 = 0.5;
    pub const MAX: f64 = 5.0;

    /// Rating stored when a promotion is skipped without choosing stars
    pub const SKIPPED: Rating = Rating(3.0);

    /// Watched movies at or above this rating feed recommendation prompts
    pub const LIKED_THRESHOLD: Rating = Rating(4.0);

    pub fn new(value: f64) -> Result<Self, AppError> {
        if !value.is_finite() || !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(AppError::InvalidInput(format!(
                "Rating must be between {} and {}",
                Self::MIN,
                Self::MAX
            )));
        }
        if (value * 2.0).fract() != 0.0 {
            return Err(AppError::InvalidInput(
                "Rating must be a multiple of 0.5".to_string(),
            ));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Rating {
    type Error = AppError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Rating::new(value)
    }
}

impl From<Rating> for f64 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// How a watchlist entry is rated when it is marked watched
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RatingChoice {
    Rated(Rating),
    /// The user dismissed the rating prompt
    Skipped,
}

impl RatingChoice {
    pub fn rating(self) -> Rating {
        match self {
            RatingChoice::Rated(rating) => rating,
            RatingChoice::Skipped => Rating::SKIPPED,
        }
    }
}

/// Arithmetic mean rounded to one decimal place; 0.0 for an empty set
pub fn mean_rating<I>(ratings: I) -> f64
where
    I: IntoIterator<Item = Rating>,
{
    let (sum, count) = ratings
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), r| (sum + r.value(), count + 1));

    if count == 0 {
        return 0.0;
    }

    (sum / count as f64 * 10.0).round() / 10.0
}
