use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::{
    error::AppResult,
    models::{MovieCard, MovieId, Session, UserPreferences},
    routes::AppState,
    services::recommendations::{self, QUICK_PROMPTS},
};

/// Omitting `query` asks for suggestions from the watch history
#[derive(Debug, Default, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub query: Option<String>,
}

/// Handler for recommendations endpoint
pub async fn recommend(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<Vec<MovieCard>>> {
    let recommendations = recommendations::recommend(
        state.store.as_ref(),
        state.catalog.as_ref(),
        &state.generator,
        &session,
        request.query.as_deref(),
    )
    .await?;

    let cards = recommendations
        .into_iter()
        .map(|r| state.posters.card(r.movie, Some(r.reason)))
        .collect();
    Ok(Json(cards))
}

pub async fn quick_prompts() -> Json<&'static [&'static str]> {
    Json(&QUICK_PROMPTS)
}

pub async fn not_interested(
    State(state): State<AppState>,
    session: Session,
    Path(movie_id): Path<MovieId>,
) -> AppResult<Json<UserPreferences>> {
    let preferences = recommendations::mark_not_interested(
        state.store.as_ref(),
        &state.changes,
        &session,
        movie_id,
    )
    .await?;
    Ok(Json(preferences))
}
