use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{ListOrder, MovieId, Rating, Session, WatchedMovie},
    routes::AppState,
    services::watched,
};

#[derive(Debug, Deserialize)]
pub struct SortQuery {
    #[serde(default)]
    pub sort: ListOrder,
}

#[derive(Debug, Deserialize)]
pub struct CreateRequest {
    pub movie_id: MovieId,
    pub rating: Rating,
}

#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    pub rating: Rating,
}

pub async fn list(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<SortQuery>,
) -> AppResult<Json<Vec<WatchedMovie>>> {
    Ok(Json(
        watched::list(state.store.as_ref(), &session, params.sort).await?,
    ))
}

pub async fn create(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CreateRequest>,
) -> AppResult<(StatusCode, Json<WatchedMovie>)> {
    let movie = watched::mark_watched(
        state.store.as_ref(),
        state.catalog.as_ref(),
        &state.changes,
        &session,
        request.movie_id,
        request.rating,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(movie)))
}

pub async fn update_rating(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
    Json(request): Json<RatingRequest>,
) -> AppResult<Json<WatchedMovie>> {
    let movie =
        watched::update_rating(state.store.as_ref(), &state.changes, &session, id, request.rating)
            .await?;
    Ok(Json(movie))
}

pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    watched::remove(state.store.as_ref(), &state.changes, &session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
