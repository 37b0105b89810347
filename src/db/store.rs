use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        ListOrder, MovieId, MovieSnapshot, Profile, Rating, Review, ReviewDraft, UserPreferences,
        WatchedMovie, WatchlistAdd, WatchlistEntry,
    },
};

/// Persistence for the per-user collections
///
/// Every operation is scoped by `user_id`; a row belonging to another user is
/// treated exactly like a missing row. Implementations must make
/// `add_to_watchlist`, `append_not_interested`, `promote` and `record_watched`
/// atomic: no interleaving of concurrent calls may lose an update or leave a
/// movie in both the watchlist and the watched collection.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    async fn create_profile(&self, user_id: Uuid, username: &str) -> AppResult<Profile>;

    async fn get_profile(&self, user_id: Uuid) -> AppResult<Option<Profile>>;

    /// Creates an empty preferences row; a no-op if one exists
    async fn create_preferences(&self, user_id: Uuid) -> AppResult<()>;

    /// Missing rows read as empty preferences
    async fn get_preferences(&self, user_id: Uuid) -> AppResult<UserPreferences>;

    /// Appends to the not-interested list unless already present
    async fn append_not_interested(
        &self,
        user_id: Uuid,
        movie_id: MovieId,
    ) -> AppResult<UserPreferences>;

    /// Inserts unless the (user, movie) pair is already on the watchlist
    async fn add_to_watchlist(
        &self,
        user_id: Uuid,
        movie: &MovieSnapshot,
    ) -> AppResult<WatchlistAdd>;

    /// Newest first
    async fn list_watchlist(&self, user_id: Uuid) -> AppResult<Vec<WatchlistEntry>>;

    async fn count_watchlist(&self, user_id: Uuid) -> AppResult<i64>;

    async fn remove_from_watchlist(&self, user_id: Uuid, entry_id: Uuid) -> AppResult<bool>;

    /// Moves a watchlist entry into the watched collection with `rating`
    ///
    /// Fails with `NotFound` when the entry does not exist, in which case
    /// nothing is written.
    async fn promote(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        rating: Rating,
    ) -> AppResult<WatchedMovie>;

    /// Records a movie as watched, removing any watchlist row for it
    ///
    /// Re-recording a watched movie replaces its rating.
    async fn record_watched(
        &self,
        user_id: Uuid,
        movie: &MovieSnapshot,
        rating: Rating,
    ) -> AppResult<WatchedMovie>;

    async fn list_watched(&self, user_id: Uuid, order: ListOrder) -> AppResult<Vec<WatchedMovie>>;

    /// Watched movies rated at least `min`, best first
    async fn top_rated_watched(
        &self,
        user_id: Uuid,
        min: Rating,
        limit: usize,
    ) -> AppResult<Vec<WatchedMovie>>;

    async fn update_watched_rating(
        &self,
        user_id: Uuid,
        watched_id: Uuid,
        rating: Rating,
    ) -> AppResult<WatchedMovie>;

    async fn remove_watched(&self, user_id: Uuid, watched_id: Uuid) -> AppResult<bool>;

    /// Creates the user's review of a movie, or replaces the existing one
    async fn upsert_review(&self, user_id: Uuid, draft: &ReviewDraft) -> AppResult<Review>;

    async fn list_reviews(&self, user_id: Uuid, order: ListOrder) -> AppResult<Vec<Review>>;

    async fn review_for_movie(&self, user_id: Uuid, movie_id: MovieId)
        -> AppResult<Option<Review>>;

    /// Soft delete; the review disappears from listings
    async fn delete_review(&self, user_id: Uuid, review_id: Uuid) -> AppResult<bool>;
}
