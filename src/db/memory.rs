use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{
        ListOrder, MovieId, MovieSnapshot, Profile, Rating, Review, ReviewDraft, UserPreferences,
        WatchedMovie, WatchlistAdd, WatchlistEntry,
    },
};

#[derive(Default)]
struct Tables {
    profiles: HashMap<Uuid, Profile>,
    preferences: HashMap<Uuid, UserPreferences>,
    watchlist: Vec<WatchlistEntry>,
    watched: Vec<WatchedMovie>,
    reviews: Vec<Review>,
}

impl Tables {
    fn upsert_watched(
        &mut self,
        user_id: Uuid,
        movie: &MovieSnapshot,
        rating: Rating,
    ) -> WatchedMovie {
        let now = Utc::now();

        if let Some(existing) = self
            .watched
            .iter_mut()
            .find(|w| w.user_id == user_id && w.movie.movie_id == movie.movie_id)
        {
            existing.rating = rating;
            existing.watched_at = now;
            return existing.clone();
        }

        let watched = WatchedMovie {
            id: Uuid::new_v4(),
            user_id,
            movie: movie.clone(),
            rating,
            watched_at: now,
        };
        self.watched.push(watched.clone());
        watched
    }
}

/// In-process `Store` for local runs and tests
///
/// All tables sit behind one lock, so every operation is trivially atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn create_profile(&self, user_id: Uuid, username: &str) -> AppResult<Profile> {
        let mut tables = self.tables.write().await;
        if tables.profiles.contains_key(&user_id) {
            return Err(AppError::InvalidInput("Profile already exists".to_string()));
        }

        let profile = Profile {
            id: user_id,
            username: username.to_string(),
            created_at: Utc::now(),
        };
        tables.profiles.insert(user_id, profile.clone());
        Ok(profile)
    }

    async fn get_profile(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        Ok(self.tables.read().await.profiles.get(&user_id).cloned())
    }

    async fn create_preferences(&self, user_id: Uuid) -> AppResult<()> {
        self.tables
            .write()
            .await
            .preferences
            .entry(user_id)
            .or_default();
        Ok(())
    }

    async fn get_preferences(&self, user_id: Uuid) -> AppResult<UserPreferences> {
        Ok(self
            .tables
            .read()
            .await
            .preferences
            .get(&user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn append_not_interested(
        &self,
        user_id: Uuid,
        movie_id: MovieId,
    ) -> AppResult<UserPreferences> {
        let mut tables = self.tables.write().await;
        let prefs = tables.preferences.entry(user_id).or_default();
        if !prefs.not_interested_movies.contains(&movie_id) {
            prefs.not_interested_movies.push(movie_id);
        }
        Ok(prefs.clone())
    }

    async fn add_to_watchlist(
        &self,
        user_id: Uuid,
        movie: &MovieSnapshot,
    ) -> AppResult<WatchlistAdd> {
        let mut tables = self.tables.write().await;

        if let Some(existing) = tables
            .watchlist
            .iter()
            .find(|e| e.user_id == user_id && e.movie.movie_id == movie.movie_id)
        {
            return Ok(WatchlistAdd::AlreadyPresent(existing.clone()));
        }

        let entry = WatchlistEntry {
            id: Uuid::new_v4(),
            user_id,
            movie: movie.clone(),
            added_at: Utc::now(),
        };
        tables.watchlist.push(entry.clone());
        Ok(WatchlistAdd::Added(entry))
    }

    async fn list_watchlist(&self, user_id: Uuid) -> AppResult<Vec<WatchlistEntry>> {
        let tables = self.tables.read().await;
        let mut entries: Vec<WatchlistEntry> = tables
            .watchlist
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        entries.sort_by(|a, b| b.added_at.cmp(&a.added_at));
        Ok(entries)
    }

    async fn count_watchlist(&self, user_id: Uuid) -> AppResult<i64> {
        let tables = self.tables.read().await;
        Ok(tables.watchlist.iter().filter(|e| e.user_id == user_id).count() as i64)
    }

    async fn remove_from_watchlist(&self, user_id: Uuid, entry_id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.watchlist.len();
        tables
            .watchlist
            .retain(|e| !(e.id == entry_id && e.user_id == user_id));
        Ok(tables.watchlist.len() < before)
    }

    async fn promote(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        rating: Rating,
    ) -> AppResult<WatchedMovie> {
        let mut tables = self.tables.write().await;

        let position = tables
            .watchlist
            .iter()
            .position(|e| e.id == entry_id && e.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("Watchlist entry {}", entry_id)))?;

        let entry = tables.watchlist.remove(position);
        Ok(tables.upsert_watched(user_id, &entry.movie, rating))
    }

    async fn record_watched(
        &self,
        user_id: Uuid,
        movie: &MovieSnapshot,
        rating: Rating,
    ) -> AppResult<WatchedMovie> {
        let mut tables = self.tables.write().await;
        tables
            .watchlist
            .retain(|e| !(e.user_id == user_id && e.movie.movie_id == movie.movie_id));
        Ok(tables.upsert_watched(user_id, movie, rating))
    }

    async fn list_watched(&self, user_id: Uuid, order: ListOrder) -> AppResult<Vec<WatchedMovie>> {
        let tables = self.tables.read().await;
        let mut movies: Vec<WatchedMovie> = tables
            .watched
            .iter()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect();
        order.sort(&mut movies, |w| w.watched_at, |w| w.rating);
        Ok(movies)
    }

    async fn top_rated_watched(
        &self,
        user_id: Uuid,
        min: Rating,
        limit: usize,
    ) -> AppResult<Vec<WatchedMovie>> {
        let mut movies = self.list_watched(user_id, ListOrder::RatingDesc).await?;
        movies.retain(|w| w.rating >= min);
        movies.truncate(limit);
        Ok(movies)
    }

    async fn update_watched_rating(
        &self,
        user_id: Uuid,
        watched_id: Uuid,
        rating: Rating,
    ) -> AppResult<WatchedMovie> {
        let mut tables = self.tables.write().await;
        let movie = tables
            .watched
            .iter_mut()
            .find(|w| w.id == watched_id && w.user_id == user_id)
            .ok_or_else(|| AppError::NotFound(format!("Watched movie {}", watched_id)))?;
        movie.rating = rating;
        Ok(movie.clone())
    }

    async fn remove_watched(&self, user_id: Uuid, watched_id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.watched.len();
        tables
            .watched
            .retain(|w| !(w.id == watched_id && w.user_id == user_id));
        Ok(tables.watched.len() < before)
    }

    async fn upsert_review(&self, user_id: Uuid, draft: &ReviewDraft) -> AppResult<Review> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        if let Some(review) = tables
            .reviews
            .iter_mut()
            .find(|r| r.user_id == user_id && r.movie_id == draft.movie_id)
        {
            if review.deleted_at.take().is_some() {
                review.created_at = now;
            }
            review.title = draft.title.clone();
            review.poster_path = draft.poster_path.clone();
            review.rating = draft.rating;
            review.body = draft.body.clone();
            review.updated_at = now;
            return Ok(review.clone());
        }

        let review = Review {
            id: Uuid::new_v4(),
            user_id,
            movie_id: draft.movie_id,
            title: draft.title.clone(),
            poster_path: draft.poster_path.clone(),
            rating: draft.rating,
            body: draft.body.clone(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        tables.reviews.push(review.clone());
        Ok(review)
    }

    async fn list_reviews(&self, user_id: Uuid, order: ListOrder) -> AppResult<Vec<Review>> {
        let tables = self.tables.read().await;
        let mut reviews: Vec<Review> = tables
            .reviews
            .iter()
            .filter(|r| r.user_id == user_id && r.deleted_at.is_none())
            .cloned()
            .collect();
        order.sort(&mut reviews, |r| r.created_at, |r| r.rating);
        Ok(reviews)
    }

    async fn review_for_movie(
        &self,
        user_id: Uuid,
        movie_id: MovieId,
    ) -> AppResult<Option<Review>> {
        let tables = self.tables.read().await;
        Ok(tables
            .reviews
            .iter()
            .find(|r| r.user_id == user_id && r.movie_id == movie_id && r.deleted_at.is_none())
            .cloned())
    }

    async fn delete_review(&self, user_id: Uuid, review_id: Uuid) -> AppResult<bool> {
        let mut tables = self.tables.write().await;
        match tables
            .reviews
            .iter_mut()
            .find(|r| r.id == review_id && r.user_id == user_id && r.deleted_at.is_none())
        {
            Some(review) => {
                let now = Utc::now();
                review.deleted_at = Some(now);
                review.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
