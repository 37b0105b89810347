use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{MovieId, Rating, Review, ReviewDraft, Session},
    routes::{watched::SortQuery, AppState},
    services::reviews::{self, ReviewStats},
};

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub rating: Option<Rating>,
    #[serde(default)]
    pub body: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<SortQuery>,
) -> AppResult<Json<Vec<Review>>> {
    Ok(Json(
        reviews::list(state.store.as_ref(), &session, params.sort).await?,
    ))
}

pub async fn stats(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<ReviewStats>> {
    Ok(Json(reviews::stats(state.store.as_ref(), &session).await?))
}

pub async fn upsert(
    State(state): State<AppState>,
    session: Session,
    Path(movie_id): Path<MovieId>,
    Json(request): Json<ReviewRequest>,
) -> AppResult<Json<Review>> {
    let draft = ReviewDraft::new(
        movie_id,
        request.title,
        request.poster_path,
        request.rating,
        request.body,
    )?;
    let review = reviews::upsert(state.store.as_ref(), &state.changes, &session, &draft).await?;
    Ok(Json(review))
}

pub async fn for_movie(
    State(state): State<AppState>,
    session: Session,
    Path(movie_id): Path<MovieId>,
) -> AppResult<Json<Review>> {
    reviews::for_movie(state.store.as_ref(), &session, movie_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Review for movie {}", movie_id)))
}

pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    reviews::delete(state.store.as_ref(), &state.changes, &session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
