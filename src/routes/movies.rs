use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    error::AppResult,
    models::{MovieCard, MovieId, TrendingWindow},
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    #[serde(default)]
    window: TrendingWindow,
}

pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<MovieCard>>> {
    let movies = state.catalog.search(&params.q).await?;
    let cards = movies
        .into_iter()
        .map(|movie| state.posters.card(movie, None))
        .collect();
    Ok(Json(cards))
}

pub async fn trending(
    State(state): State<AppState>,
    Query(params): Query<TrendingQuery>,
) -> AppResult<Json<Vec<MovieCard>>> {
    let movies = state.catalog.trending(params.window).await?;
    let cards = movies
        .into_iter()
        .map(|movie| state.posters.card(movie, None))
        .collect();
    Ok(Json(cards))
}

pub async fn details(
    State(state): State<AppState>,
    Path(id): Path<MovieId>,
) -> AppResult<Json<MovieCard>> {
    let movie = state.catalog.details(id).await?;
    Ok(Json(state.posters.card(movie, None)))
}
