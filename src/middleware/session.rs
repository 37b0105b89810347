use axum::{
    extract::{FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use serde::Deserialize;

use crate::{error::AppError, models::Session, routes::AppState, services::session};

/// Streaming clients (EventSource) cannot set headers, so they pass the token here
#[derive(Debug, Deserialize)]
struct TokenQuery {
    access_token: Option<String>,
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[axum::async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = match bearer_token(&parts.headers) {
            Some(token) => token.to_string(),
            None => Query::<TokenQuery>::try_from_uri(&parts.uri)
                .ok()
                .and_then(|Query(q)| q.access_token)
                .ok_or_else(|| AppError::Unauthorized("Please sign in".to_string()))?,
        };

        session::resolve(state.store.as_ref(), state.auth.as_ref(), &token).await
    }
}
