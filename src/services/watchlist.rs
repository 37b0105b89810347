use uuid::Uuid;

use crate::{
    db::{ChangeFeed, ChangeKind, Store, Table},
    error::{AppError, AppResult},
    models::{MovieId, MovieSnapshot, RatingChoice, Session, WatchedMovie, WatchlistAdd, WatchlistEntry},
    services::catalog::Catalog,
};

/// Newest additions first
pub async fn list(store: &dyn Store, session: &Session) -> AppResult<Vec<WatchlistEntry>> {
    store.list_watchlist(session.user_id()).await
}

pub async fn count(store: &dyn Store, session: &Session) -> AppResult<i64> {
    store.count_watchlist(session.user_id()).await
}

/// Adds a movie; adding one that is already tracked changes nothing
pub async fn add(
    store: &dyn Store,
    changes: &ChangeFeed,
    session: &Session,
    movie: &MovieSnapshot,
) -> AppResult<WatchlistAdd> {
    let user_id = session.user_id();
    let outcome = store.add_to_watchlist(user_id, movie).await?;

    match &outcome {
        WatchlistAdd::Added(entry) => {
            changes.publish(Table::Watchlist, user_id, ChangeKind::Insert);
            tracing::info!(user_id = %user_id, movie_id = entry.movie.movie_id, "Added to watchlist");
        }
        WatchlistAdd::AlreadyPresent(_) => {
            tracing::debug!(user_id = %user_id, movie_id = movie.movie_id, "Already on watchlist");
        }
    }

    Ok(outcome)
}

/// Looks the movie up in the catalog and adds its snapshot
pub async fn add_from_catalog(
    store: &dyn Store,
    catalog: &dyn Catalog,
    changes: &ChangeFeed,
    session: &Session,
    movie_id: MovieId,
) -> AppResult<WatchlistAdd> {
    let movie = catalog.details(movie_id).await?;
    add(store, changes, session, &MovieSnapshot::from(&movie)).await
}

/// Removes an entry; also serves as the undo of a recent add
pub async fn remove(
    store: &dyn Store,
    changes: &ChangeFeed,
    session: &Session,
    entry_id: Uuid,
) -> AppResult<()> {
    let user_id = session.user_id();
    if !store.remove_from_watchlist(user_id, entry_id).await? {
        return Err(AppError::NotFound(format!("Watchlist entry {}", entry_id)));
    }

    changes.publish(Table::Watchlist, user_id, ChangeKind::Delete);
    Ok(())
}

/// Moves an entry to the watched collection in one atomic step
pub async fn promote(
    store: &dyn Store,
    changes: &ChangeFeed,
    session: &Session,
    entry_id: Uuid,
    choice: RatingChoice,
) -> AppResult<WatchedMovie> {
    let user_id = session.user_id();
    let watched = store.promote(user_id, entry_id, choice.rating()).await?;

    changes.publish(Table::Watchlist, user_id, ChangeKind::Delete);
    changes.publish(Table::WatchedMovies, user_id, ChangeKind::Insert);

    tracing::info!(
        user_id = %user_id,
        movie_id = watched.movie.movie_id,
        rating = watched.rating.value(),
        skipped = matches!(choice, RatingChoice::Skipped),
        "Watchlist entry marked watched"
    );

    Ok(watched)
}
