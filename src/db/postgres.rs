use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgExecutor, PgPool};
use uuid::Uuid;

use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{
        ListOrder, MovieId, MovieSnapshot, Profile, Rating, Review, ReviewDraft, UserPreferences,
        WatchedMovie, WatchlistAdd, WatchlistEntry,
    },
};

const WATCHLIST_COLUMNS: &str =
    "id, user_id, movie_id, title, poster_path, release_year, genres, synopsis, added_at";
const WATCHED_COLUMNS: &str =
    "id, user_id, movie_id, title, poster_path, release_year, genres, synopsis, rating, watched_at";
const REVIEW_COLUMNS: &str =
    "id, user_id, movie_id, title, poster_path, rating, body, created_at, updated_at, deleted_at";

/// Connects to Postgres and applies pending migrations
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

#[derive(sqlx::FromRow)]
struct ProfileRow {
    id: Uuid,
    username: String,
    created_at: DateTime<Utc>,
}

impl From<ProfileRow> for Profile {
    fn from(row: ProfileRow) -> Self {
        Profile {
            id: row.id,
            username: row.username,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct WatchlistRow {
    id: Uuid,
    user_id: Uuid,
    movie_id: i64,
    title: String,
    poster_path: Option<String>,
    release_year: Option<i32>,
    genres: Vec<i64>,
    synopsis: String,
    added_at: DateTime<Utc>,
}

impl WatchlistRow {
    fn snapshot(&self) -> MovieSnapshot {
        MovieSnapshot {
            movie_id: self.movie_id,
            title: self.title.clone(),
            poster_path: self.poster_path.clone(),
            release_year: self.release_year,
            genres: self.genres.clone(),
            synopsis: self.synopsis.clone(),
        }
    }
}

impl From<WatchlistRow> for WatchlistEntry {
    fn from(row: WatchlistRow) -> Self {
        WatchlistEntry {
            id: row.id,
            user_id: row.user_id,
            movie: row.snapshot(),
            added_at: row.added_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct WatchedRow {
    id: Uuid,
    user_id: Uuid,
    movie_id: i64,
    title: String,
    poster_path: Option<String>,
    release_year: Option<i32>,
    genres: Vec<i64>,
    synopsis: String,
    rating: f64,
    watched_at: DateTime<Utc>,
}

impl TryFrom<WatchedRow> for WatchedMovie {
    type Error = AppError;

    fn try_from(row: WatchedRow) -> Result<Self, Self::Error> {
        Ok(WatchedMovie {
            id: row.id,
            user_id: row.user_id,
            movie: MovieSnapshot {
                movie_id: row.movie_id,
                title: row.title,
                poster_path: row.poster_path,
                release_year: row.release_year,
                genres: row.genres,
                synopsis: row.synopsis,
            },
            rating: Rating::new(row.rating)?,
            watched_at: row.watched_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    user_id: Uuid,
    movie_id: i64,
    title: String,
    poster_path: Option<String>,
    rating: f64,
    body: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = AppError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        Ok(Review {
            id: row.id,
            user_id: row.user_id,
            movie_id: row.movie_id,
            title: row.title,
            poster_path: row.poster_path,
            rating: Rating::new(row.rating)?,
            body: row.body,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        })
    }
}

fn collect<R, T>(rows: Vec<R>) -> AppResult<Vec<T>>
where
    T: TryFrom<R, Error = AppError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// Inserts a watched row, or re-rates the existing one for the same movie
async fn upsert_watched<'e, E>(
    executor: E,
    user_id: Uuid,
    movie: &MovieSnapshot,
    rating: Rating,
) -> AppResult<WatchedMovie>
where
    E: PgExecutor<'e>,
{
    let sql = format!(
        r#"
        INSERT INTO watched_movies
            (id, user_id, movie_id, title, poster_path, release_year, genres, synopsis, rating)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        ON CONFLICT (user_id, movie_id)
            DO UPDATE SET rating = EXCLUDED.rating, watched_at = now()
        RETURNING {}
        "#,
        WATCHED_COLUMNS
    );

    let row: WatchedRow = sqlx::query_as(&sql)
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(movie.movie_id)
        .bind(&movie.title)
        .bind(&movie.poster_path)
        .bind(movie.release_year)
        .bind(&movie.genres)
        .bind(&movie.synopsis)
        .bind(rating.value())
        .fetch_one(executor)
        .await?;

    row.try_into()
}

/// `Store` backed by the hosted Postgres database
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Store for PgStore {
    async fn create_profile(&self, user_id: Uuid, username: &str) -> AppResult<Profile> {
        let row: ProfileRow = sqlx::query_as(
            "INSERT INTO profiles (id, username) VALUES ($1, $2) RETURNING id, username, created_at",
        )
        .bind(user_id)
        .bind(username)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_profile(&self, user_id: Uuid) -> AppResult<Option<Profile>> {
        let row: Option<ProfileRow> =
            sqlx::query_as("SELECT id, username, created_at FROM profiles WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(Profile::from))
    }

    async fn create_preferences(&self, user_id: Uuid) -> AppResult<()> {
        sqlx::query("INSERT INTO user_preferences (user_id) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_preferences(&self, user_id: Uuid) -> AppResult<UserPreferences> {
        let row: Option<(Vec<i64>,)> = sqlx::query_as(
            "SELECT not_interested_movies FROM user_preferences WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(UserPreferences {
            not_interested_movies: row.map(|(ids,)| ids).unwrap_or_default(),
        })
    }

    async fn append_not_interested(
        &self,
        user_id: Uuid,
        movie_id: MovieId,
    ) -> AppResult<UserPreferences> {
        // Single statement: concurrent appends from several clients all land
        let (ids,): (Vec<i64>,) = sqlx::query_as(
            r#"
            INSERT INTO user_preferences (user_id, not_interested_movies)
            VALUES ($1, ARRAY[$2]::BIGINT[])
            ON CONFLICT (user_id) DO UPDATE SET
                not_interested_movies = CASE
                    WHEN $2 = ANY(user_preferences.not_interested_movies)
                        THEN user_preferences.not_interested_movies
                    ELSE array_append(user_preferences.not_interested_movies, $2)
                END,
                updated_at = now()
            RETURNING not_interested_movies
            "#,
        )
        .bind(user_id)
        .bind(movie_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(UserPreferences {
            not_interested_movies: ids,
        })
    }

    async fn add_to_watchlist(
        &self,
        user_id: Uuid,
        movie: &MovieSnapshot,
    ) -> AppResult<WatchlistAdd> {
        let sql = format!(
            r#"
            INSERT INTO watchlist
                (id, user_id, movie_id, title, poster_path, release_year, genres, synopsis)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (user_id, movie_id) DO NOTHING
            RETURNING {}
            "#,
            WATCHLIST_COLUMNS
        );

        let inserted: Option<WatchlistRow> = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(movie.movie_id)
            .bind(&movie.title)
            .bind(&movie.poster_path)
            .bind(movie.release_year)
            .bind(&movie.genres)
            .bind(&movie.synopsis)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(row) = inserted {
            return Ok(WatchlistAdd::Added(row.into()));
        }

        let existing: WatchlistRow = sqlx::query_as(&format!(
            "SELECT {} FROM watchlist WHERE user_id = $1 AND movie_id = $2",
            WATCHLIST_COLUMNS
        ))
        .bind(user_id)
        .bind(movie.movie_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(WatchlistAdd::AlreadyPresent(existing.into()))
    }

    async fn list_watchlist(&self, user_id: Uuid) -> AppResult<Vec<WatchlistEntry>> {
        let rows: Vec<WatchlistRow> = sqlx::query_as(&format!(
            "SELECT {} FROM watchlist WHERE user_id = $1 ORDER BY added_at DESC",
            WATCHLIST_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(WatchlistEntry::from).collect())
    }

    async fn count_watchlist(&self, user_id: Uuid) -> AppResult<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM watchlist WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn remove_from_watchlist(&self, user_id: Uuid, entry_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM watchlist WHERE id = $1 AND user_id = $2")
            .bind(entry_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn promote(
        &self,
        user_id: Uuid,
        entry_id: Uuid,
        rating: Rating,
    ) -> AppResult<WatchedMovie> {
        let mut tx = self.pool.begin().await?;

        let entry: Option<WatchlistRow> = sqlx::query_as(&format!(
            "SELECT {} FROM watchlist WHERE id = $1 AND user_id = $2 FOR UPDATE",
            WATCHLIST_COLUMNS
        ))
        .bind(entry_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let entry = entry
            .ok_or_else(|| AppError::NotFound(format!("Watchlist entry {}", entry_id)))?;

        let watched = upsert_watched(&mut *tx, user_id, &entry.snapshot(), rating).await?;

        sqlx::query("DELETE FROM watchlist WHERE id = $1")
            .bind(entry_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(watched)
    }

    async fn record_watched(
        &self,
        user_id: Uuid,
        movie: &MovieSnapshot,
        rating: Rating,
    ) -> AppResult<WatchedMovie> {
        let mut tx = self.pool.begin().await?;

        let watched = upsert_watched(&mut *tx, user_id, movie, rating).await?;

        sqlx::query("DELETE FROM watchlist WHERE user_id = $1 AND movie_id = $2")
            .bind(user_id)
            .bind(movie.movie_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(watched)
    }

    async fn list_watched(&self, user_id: Uuid, order: ListOrder) -> AppResult<Vec<WatchedMovie>> {
        let rows: Vec<WatchedRow> = sqlx::query_as(&format!(
            "SELECT {} FROM watched_movies WHERE user_id = $1 ORDER BY {}",
            WATCHED_COLUMNS,
            order.order_by("watched_at")
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        collect(rows)
    }

    async fn top_rated_watched(
        &self,
        user_id: Uuid,
        min: Rating,
        limit: usize,
    ) -> AppResult<Vec<WatchedMovie>> {
        let rows: Vec<WatchedRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM watched_movies
            WHERE user_id = $1 AND rating >= $2
            ORDER BY rating DESC, watched_at DESC
            LIMIT $3
            "#,
            WATCHED_COLUMNS
        ))
        .bind(user_id)
        .bind(min.value())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        collect(rows)
    }

    async fn update_watched_rating(
        &self,
        user_id: Uuid,
        watched_id: Uuid,
        rating: Rating,
    ) -> AppResult<WatchedMovie> {
        let row: Option<WatchedRow> = sqlx::query_as(&format!(
            "UPDATE watched_movies SET rating = $1 WHERE id = $2 AND user_id = $3 RETURNING {}",
            WATCHED_COLUMNS
        ))
        .bind(rating.value())
        .bind(watched_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        row.ok_or_else(|| AppError::NotFound(format!("Watched movie {}", watched_id)))?
            .try_into()
    }

    async fn remove_watched(&self, user_id: Uuid, watched_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM watched_movies WHERE id = $1 AND user_id = $2")
            .bind(watched_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn upsert_review(&self, user_id: Uuid, draft: &ReviewDraft) -> AppResult<Review> {
        // A review that was deleted and written again starts a fresh history
        let sql = format!(
            r#"
            INSERT INTO movie_reviews (id, user_id, movie_id, title, poster_path, rating, body)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (user_id, movie_id) DO UPDATE SET
                title = EXCLUDED.title,
                poster_path = EXCLUDED.poster_path,
                rating = EXCLUDED.rating,
                body = EXCLUDED.body,
                created_at = CASE
                    WHEN movie_reviews.deleted_at IS NULL THEN movie_reviews.created_at
                    ELSE now()
                END,
                updated_at = now(),
                deleted_at = NULL
            RETURNING {}
            "#,
            REVIEW_COLUMNS
        );

        let row: ReviewRow = sqlx::query_as(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(draft.movie_id)
            .bind(&draft.title)
            .bind(&draft.poster_path)
            .bind(draft.rating.value())
            .bind(&draft.body)
            .fetch_one(&self.pool)
            .await?;

        row.try_into()
    }

    async fn list_reviews(&self, user_id: Uuid, order: ListOrder) -> AppResult<Vec<Review>> {
        let rows: Vec<ReviewRow> = sqlx::query_as(&format!(
            "SELECT {} FROM movie_reviews WHERE user_id = $1 AND deleted_at IS NULL ORDER BY {}",
            REVIEW_COLUMNS,
            order.order_by("created_at")
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        collect(rows)
    }

    async fn review_for_movie(
        &self,
        user_id: Uuid,
        movie_id: MovieId,
    ) -> AppResult<Option<Review>> {
        let row: Option<ReviewRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM movie_reviews
            WHERE user_id = $1 AND movie_id = $2 AND deleted_at IS NULL
            "#,
            REVIEW_COLUMNS
        ))
        .bind(user_id)
        .bind(movie_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Review::try_from).transpose()
    }

    async fn delete_review(&self, user_id: Uuid, review_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE movie_reviews SET deleted_at = now(), updated_at = now()
            WHERE id = $1 AND user_id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(review_id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
