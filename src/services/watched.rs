use uuid::Uuid;

use crate::{
    db::{ChangeFeed, ChangeKind, Store, Table},
    error::{AppError, AppResult},
    models::{ListOrder, MovieId, MovieSnapshot, Rating, Session, WatchedMovie},
    services::catalog::Catalog,
};

pub async fn list(
    store: &dyn Store,
    session: &Session,
    order: ListOrder,
) -> AppResult<Vec<WatchedMovie>> {
    store.list_watched(session.user_id(), order).await
}

/// Records a movie straight from a recommendation card
///
/// Any watchlist row for the same movie is removed in the same step.
pub async fn mark_watched(
    store: &dyn Store,
    catalog: &dyn Catalog,
    changes: &ChangeFeed,
    session: &Session,
    movie_id: MovieId,
    rating: Rating,
) -> AppResult<WatchedMovie> {
    let user_id = session.user_id();
    let movie = catalog.details(movie_id).await?;
    let watched = store
        .record_watched(user_id, &MovieSnapshot::from(&movie), rating)
        .await?;

    changes.publish(Table::WatchedMovies, user_id, ChangeKind::Insert);
    changes.publish(Table::Watchlist, user_id, ChangeKind::Delete);

    tracing::info!(user_id = %user_id, movie_id, rating = rating.value(), "Movie marked watched");
    Ok(watched)
}

pub async fn update_rating(
    store: &dyn Store,
    changes: &ChangeFeed,
    session: &Session,
    watched_id: Uuid,
    rating: Rating,
) -> AppResult<WatchedMovie> {
    let user_id = session.user_id();
    let watched = store
        .update_watched_rating(user_id, watched_id, rating)
        .await?;

    changes.publish(Table::WatchedMovies, user_id, ChangeKind::Update);
    Ok(watched)
}

pub async fn remove(
    store: &dyn Store,
    changes: &ChangeFeed,
    session: &Session,
    watched_id: Uuid,
) -> AppResult<()> {
    let user_id = session.user_id();
    if !store.remove_watched(user_id, watched_id).await? {
        return Err(AppError::NotFound(format!("Watched movie {}", watched_id)));
    }

    changes.publish(Table::WatchedMovies, user_id, ChangeKind::Delete);
    Ok(())
}
