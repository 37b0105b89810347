use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{MovieId, MovieSnapshot, Rating};
use crate::error::AppError;

/// Longest review body accepted, in characters
pub const MAX_REVIEW_CHARS: usize = 1000;

/// A movie the user intends to watch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchlistEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub movie: MovieSnapshot,
    pub added_at: DateTime<Utc>,
}

/// Outcome of adding a movie to the watchlist
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "status", content = "entry", rename_all = "snake_case")]
pub enum WatchlistAdd {
    Added(WatchlistEntry),
    /// The (user, movie) pair was already tracked; nothing was written
    AlreadyPresent(WatchlistEntry),
}

impl WatchlistAdd {
    pub fn entry(&self) -> &WatchlistEntry {
        match self {
            WatchlistAdd::Added(entry) | WatchlistAdd::AlreadyPresent(entry) => entry,
        }
    }
}

/// A movie the user has watched and rated
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchedMovie {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub movie: MovieSnapshot,
    pub rating: Rating,
    pub watched_at: DateTime<Utc>,
}

/// A user's review of one movie; at most one live review per (user, movie)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: Uuid,
    pub user_id: Uuid,
    pub movie_id: MovieId,
    pub title: String,
    pub poster_path: Option<String>,
    pub rating: Rating,
    pub body: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing)]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Validated review input
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewDraft {
    pub movie_id: MovieId,
    pub title: String,
    pub poster_path: Option<String>,
    pub rating: Rating,
    pub body: Option<String>,
}

impl ReviewDraft {
    pub fn new(
        movie_id: MovieId,
        title: String,
        poster_path: Option<String>,
        rating: Option<Rating>,
        body: Option<String>,
    ) -> Result<Self, AppError> {
        let rating =
            rating.ok_or_else(|| AppError::InvalidInput("Please select a rating".to_string()))?;

        let body = body
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        if let Some(text) = &body {
            if text.chars().count() > MAX_REVIEW_CHARS {
                return Err(AppError::InvalidInput(format!(
                    "Review must be at most {} characters",
                    MAX_REVIEW_CHARS
                )));
            }
        }

        Ok(Self {
            movie_id,
            title,
            poster_path,
            rating,
            body,
        })
    }
}
