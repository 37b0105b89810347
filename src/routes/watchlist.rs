use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::{stream, Stream};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    db::Table,
    error::{AppError, AppResult},
    models::{MovieId, Rating, RatingChoice, Session, WatchedMovie, WatchlistAdd, WatchlistEntry},
    routes::AppState,
    services::watchlist,
};

#[derive(Debug, Deserialize)]
pub struct AddRequest {
    pub movie_id: MovieId,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

/// Either a rating or an explicit skip
#[derive(Debug, Deserialize)]
pub struct MarkWatchedRequest {
    #[serde(default)]
    pub rating: Option<Rating>,
    #[serde(default)]
    pub skip: bool,
}

impl MarkWatchedRequest {
    fn choice(&self) -> AppResult<RatingChoice> {
        match (self.rating, self.skip) {
            (_, true) => Ok(RatingChoice::Skipped),
            (Some(rating), false) => Ok(RatingChoice::Rated(rating)),
            (None, false) => Err(AppError::InvalidInput(
                "Please select a rating".to_string(),
            )),
        }
    }
}

pub async fn list(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<Vec<WatchlistEntry>>> {
    Ok(Json(watchlist::list(state.store.as_ref(), &session).await?))
}

pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<AddRequest>,
) -> AppResult<(StatusCode, Json<WatchlistAdd>)> {
    let outcome = watchlist::add_from_catalog(
        state.store.as_ref(),
        state.catalog.as_ref(),
        &state.changes,
        &session,
        request.movie_id,
    )
    .await?;

    let status = match outcome {
        WatchlistAdd::Added(_) => StatusCode::CREATED,
        WatchlistAdd::AlreadyPresent(_) => StatusCode::OK,
    };
    Ok((status, Json(outcome)))
}

pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    watchlist::remove(state.store.as_ref(), &state.changes, &session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn count(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<CountResponse>> {
    let count = watchlist::count(state.store.as_ref(), &session).await?;
    Ok(Json(CountResponse { count }))
}

/// Server-sent `count` events: the current count on connect, then after every change
pub async fn count_stream(
    State(state): State<AppState>,
    session: Session,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let subscription = state.changes.subscribe(Table::Watchlist, session.user_id());

    let events = stream::unfold(
        (state, session, subscription, true),
        |(state, session, mut subscription, first)| async move {
            if !first {
                subscription.next().await?;
            }

            match watchlist::count(state.store.as_ref(), &session).await {
                Ok(count) => {
                    let event = Event::default()
                        .event("count")
                        .json_data(CountResponse { count });
                    Some((event, (state, session, subscription, false)))
                }
                Err(e) => {
                    tracing::warn!(error = %e, user_id = %session.user_id(), "Watchlist count stream ended");
                    None
                }
            }
        },
    );

    Sse::new(events).keep_alive(KeepAlive::default())
}

pub async fn mark_watched(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(request): Json<MarkWatchedRequest>,
) -> AppResult<Json<WatchedMovie>> {
    let choice = request.choice()?;
    let watched =
        watchlist::promote(state.store.as_ref(), &state.changes, &session, id, choice).await?;
    Ok(Json(watched))
}
