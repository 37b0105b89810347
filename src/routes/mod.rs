use std::{sync::Arc, time::Duration};

use axum::{
    http::StatusCode,
    middleware,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    db::{ChangeFeed, Store},
    middleware::{make_span_with_request_id, request_id_middleware},
    services::{AuthProvider, Catalog, PosterUrls, SuggestionGenerator},
};

pub mod auth;
pub mod live;
pub mod movies;
pub mod profile;
pub mod recommendations;
pub mod reviews;
pub mod watched;
pub mod watchlist;

/// Shared handles every handler draws from
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub catalog: Arc<dyn Catalog>,
    pub auth: Arc<dyn AuthProvider>,
    pub generator: Arc<SuggestionGenerator>,
    pub posters: PosterUrls,
    pub changes: ChangeFeed,
    pub search_debounce: Duration,
}

/// Creates the application router with all routes and layers
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(CorsLayer::permissive())
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id)),
        )
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(auth::sign_up))
        .route("/auth/login", post(auth::sign_in))
        .route("/auth/logout", post(auth::sign_out))
        .route("/auth/session", get(auth::current_session))
        .route("/movies/search", get(movies::search))
        .route("/movies/trending", get(movies::trending))
        .route("/movies/:id", get(movies::details))
        .route("/search/live", get(live::live_search))
        .route("/watchlist", get(watchlist::list).post(watchlist::add))
        .route("/watchlist/count", get(watchlist::count))
        .route("/watchlist/count/stream", get(watchlist::count_stream))
        .route("/watchlist/:id", delete(watchlist::remove))
        .route("/watchlist/:id/watched", post(watchlist::mark_watched))
        .route("/watched", get(watched::list).post(watched::create))
        .route(
            "/watched/:id",
            axum::routing::patch(watched::update_rating).delete(watched::remove),
        )
        .route("/reviews", get(reviews::list))
        .route("/reviews/stats", get(reviews::stats))
        .route(
            "/reviews/movie/:movie_id",
            put(reviews::upsert).get(reviews::for_movie),
        )
        .route("/reviews/:id", delete(reviews::remove))
        .route("/profile", get(profile::overview))
        .route("/recommendations", post(recommendations::recommend))
        .route("/recommendations/prompts", get(recommendations::quick_prompts))
        .route(
            "/recommendations/not-interested/:movie_id",
            post(recommendations::not_interested),
        )
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
