use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::{
    error::AppResult,
    models::{Profile, Session, SignInRequest, SignUpRequest},
    routes::AppState,
    services::session,
};

#[derive(Debug, Serialize)]
pub struct SignInResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub session: Session,
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<SignUpRequest>,
) -> AppResult<(StatusCode, Json<Profile>)> {
    let profile = session::sign_up(state.store.as_ref(), state.auth.as_ref(), &request).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn sign_in(
    State(state): State<AppState>,
    Json(request): Json<SignInRequest>,
) -> AppResult<Json<SignInResponse>> {
    let (tokens, session) =
        session::sign_in(state.store.as_ref(), state.auth.as_ref(), &request).await?;

    Ok(Json(SignInResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        session,
    }))
}

pub async fn sign_out(State(state): State<AppState>, session: Session) -> AppResult<StatusCode> {
    session::sign_out(state.auth.as_ref(), session).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn current_session(session: Session) -> Json<Session> {
    Json(session)
}
