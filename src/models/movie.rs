use serde::{Deserialize, Serialize};

/// TMDB movie identifier
pub type MovieId = i64;

const NO_SYNOPSIS: &str = "No synopsis available";

/// A movie record as returned by the catalog; never persisted verbatim
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogMovie {
    pub id: MovieId,
    pub title: String,
    pub poster_path: Option<String>,
    pub release_date: Option<String>,
    pub overview: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
}

impl CatalogMovie {
    /// Year prefix of an ISO `YYYY-MM-DD` release date
    pub fn release_year(&self) -> Option<i32> {
        self.release_date
            .as_deref()
            .and_then(|date| date.split('-').next())
            .and_then(|year| year.parse().ok())
    }
}

/// Denormalized copy of a catalog movie kept on watchlist and watched rows
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieSnapshot {
    pub movie_id: MovieId,
    pub title: String,
    pub poster_path: Option<String>,
    pub release_year: Option<i32>,
    #[serde(default)]
    pub genres: Vec<i64>,
    pub synopsis: String,
}

impl From<&CatalogMovie> for MovieSnapshot {
    fn from(movie: &CatalogMovie) -> Self {
        Self {
            movie_id: movie.id,
            title: movie.title.clone(),
            poster_path: movie.poster_path.clone(),
            release_year: movie.release_year(),
            genres: movie.genre_ids.clone(),
            synopsis: movie
                .overview
                .clone()
                .unwrap_or_else(|| NO_SYNOPSIS.to_string()),
        }
    }
}

/// Time window for the trending listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendingWindow {
    Day,
    #[default]
    Week,
}

impl TrendingWindow {
    pub fn as_str(self) -> &'static str {
        match self {
            TrendingWindow::Day => "day",
            TrendingWindow::Week => "week",
        }
    }
}

/// A catalog movie as presented to clients, with its poster resolved
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieCard {
    #[serde(flatten)]
    pub movie: CatalogMovie,
    pub poster_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
