use serde::Deserialize;

pub mod collections;
pub mod movie;
pub mod ordering;
pub mod rating;
pub mod suggestion;
pub mod user;

pub use collections::{Review, ReviewDraft, WatchedMovie, WatchlistAdd, WatchlistEntry};
pub use movie::{CatalogMovie, MovieCard, MovieId, MovieSnapshot, TrendingWindow};
pub use ordering::ListOrder;
pub use rating::{mean_rating, Rating, RatingChoice};
pub use suggestion::{EnrichedMovie, LikedMovie, PromptContext, SuggestionCandidate};
pub use user::{
    AuthTokens, AuthUser, Profile, Session, SignInRequest, SignUpRequest, UserPreferences,
};

// ============================================================================
// TMDB API Types
// ============================================================================

/// Paged list response from `/search/movie` and `/trending/movie/{window}`
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbListResponse {
    #[serde(default)]
    pub results: Vec<TmdbMovie>,
}

/// Movie object as TMDB returns it in lists and from `/movie/{id}`
#[derive(Debug, Clone, Deserialize)]
pub struct TmdbMovie {
    pub id: MovieId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
    /// Present on list results
    #[serde(default)]
    pub genre_ids: Vec<i64>,
    /// Present on the details endpoint instead of `genre_ids`
    #[serde(default)]
    pub genres: Vec<TmdbGenre>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TmdbGenre {
    pub id: i64,
}

impl From<TmdbMovie> for CatalogMovie {
    fn from(movie: TmdbMovie) -> Self {
        let genre_ids = if movie.genre_ids.is_empty() {
            movie.genres.iter().map(|g| g.id).collect()
        } else {
            movie.genre_ids
        };

        // TMDB sends empty strings rather than nulls for unknown values
        CatalogMovie {
            id: movie.id,
            title: movie.title,
            poster_path: movie.poster_path.filter(|p| !p.is_empty()),
            release_date: movie.release_date.filter(|d| !d.is_empty()),
            overview: movie.overview.filter(|o| !o.trim().is_empty()),
            genre_ids,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_result_to_catalog_movie() {
        let json = r#"{
            "id": 27205,
            "title": "Inception",
            "poster_path": "/9gk7adHYeDvHkCSEqAvQNLV5Uge.jpg",
            "release_date": "2010-07-15",
            "overview": "Cobb, a skilled thief...",
            "genre_ids": [28, 878, 12],
            "popularity": 83.9
        }"#;

        let raw: TmdbMovie = serde_json::from_str(json).unwrap();
        let movie: CatalogMovie = raw.into();
        assert_eq!(movie.id, 27205);
        assert_eq!(movie.title, "Inception");
        assert_eq!(movie.genre_ids, vec![28, 878, 12]);
        assert_eq!(movie.release_year(), Some(2010));
    }

    #[test]
    fn test_details_genres_become_ids() {
        let json = r#"{
            "id": 155,
            "title": "The Dark Knight",
            "genres": [{"id": 18, "name": "Drama"}, {"id": 28, "name": "Action"}]
        }"#;

        let movie: CatalogMovie = serde_json::from_str::<TmdbMovie>(json).unwrap().into();
        assert_eq!(movie.genre_ids, vec![18, 28]);
        assert_eq!(movie.poster_path, None);
    }

    #[test]
    fn test_empty_strings_become_none() {
        let json = r#"{"id": 1, "title": "Untitled", "release_date": "", "overview": " ", "poster_path": null}"#;

        let movie: CatalogMovie = serde_json::from_str::<TmdbMovie>(json).unwrap().into();
        assert_eq!(movie.release_date, None);
        assert_eq!(movie.overview, None);
    }

    #[test]
    fn test_list_response_missing_results() {
        let list: TmdbListResponse = serde_json::from_str(r#"{"page": 1}"#).unwrap();
        assert!(list.results.is_empty());
    }
}
