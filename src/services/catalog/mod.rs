/// Movie catalog abstraction
///
/// The catalog is the read-only source of movie metadata. Searches are ranked
/// by the provider; callers that need a single match take the first result.
use crate::{
    error::AppResult,
    models::{CatalogMovie, MovieCard, MovieId, TrendingWindow},
};

pub mod tmdb;

pub use tmdb::TmdbCatalog;

const PLACEHOLDER_POSTER: &str = "https://via.placeholder.com/500x750?text=No+Image";

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Catalog: Send + Sync {
    /// Search movies by title, best match first
    ///
    /// Blank queries return an empty list without contacting the provider.
    async fn search(&self, title: &str) -> AppResult<Vec<CatalogMovie>>;

    /// Currently trending movies, at most eight
    async fn trending(&self, window: TrendingWindow) -> AppResult<Vec<CatalogMovie>>;

    /// Full record for one movie
    async fn details(&self, id: MovieId) -> AppResult<CatalogMovie>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Builds absolute poster URLs from catalog-relative paths
#[derive(Debug, Clone)]
pub struct PosterUrls {
    base: String,
}

impl PosterUrls {
    pub fn new(base: impl Into<String>) -> Self {
        Self { base: base.into() }
    }

    pub fn url(&self, path: Option<&str>) -> String {
        match path {
            Some(path) if !path.is_empty() => format!("{}{}", self.base, path),
            _ => PLACEHOLDER_POSTER.to_string(),
        }
    }

    pub fn card(&self, movie: CatalogMovie, reason: Option<String>) -> MovieCard {
        MovieCard {
            poster_url: self.url(movie.poster_path.as_deref()),
            movie,
            reason,
        }
    }
}
