use axum::{extract::State, Json};

use crate::{
    error::AppResult,
    models::Session,
    routes::AppState,
    services::profile::{self, ProfileOverview},
};

pub async fn overview(
    State(state): State<AppState>,
    session: Session,
) -> AppResult<Json<ProfileOverview>> {
    Ok(Json(profile::overview(state.store.as_ref(), &session).await?))
}
