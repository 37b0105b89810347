use std::{collections::HashMap, sync::Arc, time::Duration};

use axum::{
    http::{header, HeaderValue, StatusCode},
    Router,
};
use axum_test::{TestServer, TestServerConfig};
use serde_json::{json, Value};
use uuid::Uuid;

use cinelog::{
    db::{ChangeFeed, MemoryStore},
    error::{AppError, AppResult},
    models::{AuthTokens, AuthUser, CatalogMovie, MovieId, TrendingWindow},
    routes::{create_router, AppState},
    services::{AuthProvider, Catalog, PosterUrls, SuggestionGenerator},
};

const IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";

/// Fixed catalog matched by case-insensitive substring; every search query is recorded
struct StubCatalog {
    movies: Vec<CatalogMovie>,
    searches: Arc<std::sync::Mutex<Vec<String>>>,
}

impl StubCatalog {
    fn new() -> Self {
        let titles = [
            (27205, "Inception", "2010-07-15"),
            (157336, "Interstellar", "2014-11-05"),
            (155, "The Dark Knight", "2008-07-16"),
            (278, "The Shawshank Redemption", "1994-09-23"),
            (76341, "Mad Max Fury Road", "2015-05-13"),
            (245891, "John Wick", "2014-10-22"),
            (954, "Mission Impossible", "1996-05-22"),
        ];
        let movies = titles
            .into_iter()
            .map(|(id, title, date)| CatalogMovie {
                id,
                title: title.to_string(),
                poster_path: Some(format!("/{}.jpg", id)),
                release_date: Some(date.to_string()),
                overview: Some(format!("{} overview", title)),
                genre_ids: vec![28],
            })
            .collect();
        Self {
            movies,
            searches: Arc::default(),
        }
    }
}

#[async_trait::async_trait]
impl Catalog for StubCatalog {
    async fn search(&self, title: &str) -> AppResult<Vec<CatalogMovie>> {
        self.searches.lock().unwrap().push(title.to_string());
        let needle = title.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(vec![]);
        }
        Ok(self
            .movies
            .iter()
            .filter(|m| m.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }

    async fn trending(&self, _window: TrendingWindow) -> AppResult<Vec<CatalogMovie>> {
        Ok(self.movies.iter().take(8).cloned().collect())
    }

    async fn details(&self, id: MovieId) -> AppResult<CatalogMovie> {
        self.movies
            .iter()
            .find(|m| m.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Movie {}", id)))
    }

    fn name(&self) -> &'static str {
        "stub"
    }
}

/// Accepts any password of six or more characters; tokens are `token-{email}`
#[derive(Default)]
struct StubAuth {
    users: std::sync::Mutex<HashMap<String, Uuid>>,
}

#[async_trait::async_trait]
impl AuthProvider for StubAuth {
    async fn sign_up(&self, email: &str, _password: &str) -> AppResult<AuthUser> {
        let mut users = self.users.lock().unwrap();
        let id = *users.entry(email.to_string()).or_insert_with(Uuid::new_v4);
        Ok(AuthUser {
            id,
            email: Some(email.to_string()),
        })
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<AuthTokens> {
        let id = self.users.lock().unwrap().get(email).copied();
        match id {
            Some(id) if password.len() >= 6 => Ok(AuthTokens {
                access_token: format!("token-{}", email),
                refresh_token: None,
                user: AuthUser {
                    id,
                    email: Some(email.to_string()),
                },
            }),
            _ => Err(AppError::Unauthorized("Invalid login credentials".to_string())),
        }
    }

    async fn user_for_token(&self, access_token: &str) -> AppResult<AuthUser> {
        let email = access_token
            .strip_prefix("token-")
            .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;
        let id = self
            .users
            .lock()
            .unwrap()
            .get(email)
            .copied()
            .ok_or_else(|| AppError::Unauthorized("Invalid token".to_string()))?;
        Ok(AuthUser {
            id,
            email: Some(email.to_string()),
        })
    }

    async fn sign_out(&self, _access_token: &str) -> AppResult<()> {
        Ok(())
    }
}

fn test_app(catalog: StubCatalog, search_debounce: Duration) -> Router {
    let state = AppState {
        store: Arc::new(MemoryStore::new()),
        catalog: Arc::new(catalog),
        auth: Arc::new(StubAuth::default()),
        generator: Arc::new(SuggestionGenerator::new(None)),
        posters: PosterUrls::new(IMAGE_BASE),
        changes: ChangeFeed::new(),
        search_debounce,
    };
    create_router(state)
}

fn create_test_server() -> TestServer {
    TestServer::new(test_app(StubCatalog::new(), Duration::from_millis(500))).unwrap()
}

/// Server on a real port, needed for sockets and streamed responses
fn create_http_test_server(catalog: StubCatalog, search_debounce: Duration) -> TestServer {
    TestServerConfig::builder()
        .http_transport()
        .build_server(test_app(catalog, search_debounce))
        .unwrap()
}

/// Signs up and in, returning the Authorization header value
async fn signed_in(server: &TestServer, email: &str) -> HeaderValue {
    server
        .post("/api/v1/auth/signup")
        .json(&json!({ "email": email, "password": "secret1", "username": "ana" }))
        .await
        .assert_status(StatusCode::CREATED);

    let response = server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": email, "password": "secret1" }))
        .await;
    response.assert_status_ok();

    let body: Value = response.json();
    let token = body["access_token"].as_str().unwrap();
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_json(&json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_sign_up_validation() {
    let server = create_test_server();

    let response = server
        .post("/api/v1/auth/signup")
        .json(&json!({ "email": "a@b.c", "password": "123", "username": "ana" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post("/api/v1/auth/signup")
        .json(&json!({ "email": "a@b.c", "password": "secret1" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert_eq!(body["error"], "All fields are required");
}

#[tokio::test]
async fn test_session_requires_token() {
    let server = create_test_server();

    server
        .get("/api/v1/auth/session")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let auth = signed_in(&server, "ana@example.com").await;
    let response = server
        .get("/api/v1/auth/session")
        .add_header(header::AUTHORIZATION, auth)
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["profile"]["username"], "ana");
    assert!(body.get("access_token").is_none());
}

#[tokio::test]
async fn test_movie_search_builds_poster_urls() {
    let server = create_test_server();

    let response = server
        .get("/api/v1/movies/search")
        .add_query_param("q", "inter")
        .await;
    response.assert_status_ok();

    let movies: Vec<Value> = response.json();
    assert_eq!(movies.len(), 1);
    assert_eq!(movies[0]["title"], "Interstellar");
    assert_eq!(
        movies[0]["poster_url"],
        format!("{}/157336.jpg", IMAGE_BASE)
    );
}

#[tokio::test]
async fn test_movie_details_not_found() {
    let server = create_test_server();
    server.get("/api/v1/movies/1").await.assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_watchlist_add_is_idempotent() {
    let server = create_test_server();
    let auth = signed_in(&server, "ana@example.com").await;

    let first = server
        .post("/api/v1/watchlist")
        .add_header(header::AUTHORIZATION, auth.clone())
        .json(&json!({ "movie_id": 27205 }))
        .await;
    first.assert_status(StatusCode::CREATED);
    let first: Value = first.json();
    assert_eq!(first["status"], "added");

    let second = server
        .post("/api/v1/watchlist")
        .add_header(header::AUTHORIZATION, auth.clone())
        .json(&json!({ "movie_id": 27205 }))
        .await;
    second.assert_status_ok();
    let second: Value = second.json();
    assert_eq!(second["status"], "already_present");
    assert_eq!(second["entry"]["id"], first["entry"]["id"]);

    let count = server
        .get("/api/v1/watchlist/count")
        .add_header(header::AUTHORIZATION, auth)
        .await;
    count.assert_json(&json!({ "count": 1 }));
}

#[tokio::test]
async fn test_promotion_moves_entry() {
    let server = create_test_server();
    let auth = signed_in(&server, "ana@example.com").await;

    let added: Value = server
        .post("/api/v1/watchlist")
        .add_header(header::AUTHORIZATION, auth.clone())
        .json(&json!({ "movie_id": 155 }))
        .await
        .json();
    let entry_id = added["entry"]["id"].as_str().unwrap().to_string();

    let missing_rating = server
        .post(&format!("/api/v1/watchlist/{}/watched", entry_id))
        .add_header(header::AUTHORIZATION, auth.clone())
        .json(&json!({}))
        .await;
    missing_rating.assert_status(StatusCode::BAD_REQUEST);

    let response = server
        .post(&format!("/api/v1/watchlist/{}/watched", entry_id))
        .add_header(header::AUTHORIZATION, auth.clone())
        .json(&json!({ "skip": true }))
        .await;
    response.assert_status_ok();
    let watched: Value = response.json();
    assert_eq!(watched["rating"], 3.0);

    let watchlist: Vec<Value> = server
        .get("/api/v1/watchlist")
        .add_header(header::AUTHORIZATION, auth.clone())
        .await
        .json();
    assert!(watchlist.is_empty());

    let history: Vec<Value> = server
        .get("/api/v1/watched")
        .add_header(header::AUTHORIZATION, auth)
        .await
        .json();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["movie_id"], 155);
}

#[tokio::test]
async fn test_watchlist_scoped_per_user() {
    let server = create_test_server();
    let ana = signed_in(&server, "ana@example.com").await;
    let ben = signed_in(&server, "ben@example.com").await;

    let added: Value = server
        .post("/api/v1/watchlist")
        .add_header(header::AUTHORIZATION, ana)
        .json(&json!({ "movie_id": 278 }))
        .await
        .json();
    let entry_id = added["entry"]["id"].as_str().unwrap().to_string();

    server
        .delete(&format!("/api/v1/watchlist/{}", entry_id))
        .add_header(header::AUTHORIZATION, ben)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_watched_sort_and_profile_stats() {
    let server = create_test_server();
    let auth = signed_in(&server, "ana@example.com").await;

    for (movie_id, rating) in [(27205, 5.0), (155, 3.0), (278, 4.0)] {
        server
            .post("/api/v1/watched")
            .add_header(header::AUTHORIZATION, auth.clone())
            .json(&json!({ "movie_id": movie_id, "rating": rating }))
            .await
            .assert_status(StatusCode::CREATED);
    }

    let by_rating: Vec<Value> = server
        .get("/api/v1/watched")
        .add_query_param("sort", "rating-asc")
        .add_header(header::AUTHORIZATION, auth.clone())
        .await
        .json();
    let ids: Vec<i64> = by_rating.iter().map(|w| w["movie_id"].as_i64().unwrap()).collect();
    assert_eq!(ids, vec![155, 278, 27205]);

    let profile: Value = server
        .get("/api/v1/profile")
        .add_header(header::AUTHORIZATION, auth)
        .await
        .json();
    assert_eq!(profile["stats"]["watched_count"], 3);
    assert_eq!(profile["stats"]["average_rating"], 4.0);
    assert_eq!(profile["profile"]["username"], "ana");
}

#[tokio::test]
async fn test_invalid_rating_rejected() {
    let server = create_test_server();
    let auth = signed_in(&server, "ana@example.com").await;

    let response = server
        .post("/api/v1/watched")
        .add_header(header::AUTHORIZATION, auth)
        .json(&json!({ "movie_id": 27205, "rating": 4.3 }))
        .await;
    assert!(response.status_code().is_client_error());
}

#[tokio::test]
async fn test_review_upsert_and_delete() {
    let server = create_test_server();
    let auth = signed_in(&server, "ana@example.com").await;

    server
        .put("/api/v1/reviews/movie/27205")
        .add_header(header::AUTHORIZATION, auth.clone())
        .json(&json!({ "title": "Inception", "body": "great" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let first: Value = server
        .put("/api/v1/reviews/movie/27205")
        .add_header(header::AUTHORIZATION, auth.clone())
        .json(&json!({ "title": "Inception", "rating": 4.0, "body": "  great  " }))
        .await
        .json();
    assert_eq!(first["body"], "great");

    let second: Value = server
        .put("/api/v1/reviews/movie/27205")
        .add_header(header::AUTHORIZATION, auth.clone())
        .json(&json!({ "title": "Inception", "rating": 5.0 }))
        .await
        .json();
    assert_eq!(second["id"], first["id"]);
    assert_eq!(second["body"], Value::Null);

    let stats: Value = server
        .get("/api/v1/reviews/stats")
        .add_header(header::AUTHORIZATION, auth.clone())
        .await
        .json();
    assert_eq!(stats, json!({ "count": 1, "average_rating": 5.0 }));

    let review_id = second["id"].as_str().unwrap().to_string();
    server
        .delete(&format!("/api/v1/reviews/{}", review_id))
        .add_header(header::AUTHORIZATION, auth.clone())
        .await
        .assert_status(StatusCode::NO_CONTENT);

    server
        .get("/api/v1/reviews/movie/27205")
        .add_header(header::AUTHORIZATION, auth)
        .await
        .assert_status(StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_recommendations_fallback_and_not_interested() {
    let server = create_test_server();
    let auth = signed_in(&server, "ana@example.com").await;

    let response = server
        .post("/api/v1/recommendations")
        .add_header(header::AUTHORIZATION, auth.clone())
        .json(&json!({ "query": "Suggest action movies released after 2020" }))
        .await;
    response.assert_status_ok();
    let cards: Vec<Value> = response.json();
    assert_eq!(cards.len(), 4);
    assert_eq!(cards[0]["title"], "Mad Max Fury Road");
    assert_eq!(cards[0]["reason"], "Popular action movie matching your query");

    let prefs: Value = server
        .post("/api/v1/recommendations/not-interested/245891")
        .add_header(header::AUTHORIZATION, auth.clone())
        .await
        .json();
    assert_eq!(prefs["not_interested_movies"], json!([245891]));

    let cards: Vec<Value> = server
        .post("/api/v1/recommendations")
        .add_header(header::AUTHORIZATION, auth)
        .json(&json!({ "query": "Suggest action movies released after 2020" }))
        .await
        .json();
    assert_eq!(cards.len(), 3);
    assert!(cards.iter().all(|c| c["id"] != 245891));
}

#[tokio::test]
async fn test_recommendations_input_validation() {
    let server = create_test_server();
    let auth = signed_in(&server, "ana@example.com").await;

    server
        .post("/api/v1/recommendations")
        .add_header(header::AUTHORIZATION, auth.clone())
        .json(&json!({ "query": "   " }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    // History mode without any highly rated movies
    server
        .post("/api/v1/recommendations")
        .add_header(header::AUTHORIZATION, auth)
        .json(&json!({}))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_quick_prompts() {
    let server = create_test_server();
    let prompts: Vec<String> = server.get("/api/v1/recommendations/prompts").await.json();
    assert_eq!(prompts.len(), 6);
    assert_eq!(prompts[0], "Suggest action movies released after 2020");
}

#[tokio::test]
async fn test_request_id_echoed() {
    let server = create_test_server();
    let response = server.get("/health").await;
    let request_id = response.header("x-request-id");
    tokio_test::assert_ok!(Uuid::parse_str(request_id.to_str().unwrap()));
}

#[tokio::test]
async fn test_live_search_publishes_only_the_settled_query() {
    let catalog = StubCatalog::new();
    let searches = catalog.searches.clone();
    let server = create_http_test_server(catalog, Duration::from_millis(100));

    let mut socket = server
        .get_websocket("/api/v1/search/live")
        .await
        .into_websocket()
        .await;

    socket.send_text("Incep").await;
    socket.send_text("Inception").await;

    let frame: Value = socket.receive_json().await;
    assert_eq!(frame["query"], "Inception");
    assert_eq!(frame["seq"], 2);
    assert_eq!(frame["movies"].as_array().unwrap().len(), 1);
    assert_eq!(frame["movies"][0]["title"], "Inception");

    // The superseded query never reaches the catalog, so no second frame exists
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(*searches.lock().unwrap(), vec!["Inception".to_string()]);

    socket.close().await;
}

/// Reads the SSE body until it contains `needle`
async fn read_until(response: &mut reqwest::Response, buffer: &mut String, needle: &str) {
    let read = tokio::time::timeout(Duration::from_secs(5), async {
        while !buffer.contains(needle) {
            let chunk = response
                .chunk()
                .await
                .unwrap()
                .expect("count stream ended early");
            buffer.push_str(&String::from_utf8_lossy(&chunk));
        }
    })
    .await;
    assert!(read.is_ok(), "no {} event in: {}", needle, buffer);
}

#[tokio::test]
async fn test_watchlist_count_stream_follows_adds() {
    let server = create_http_test_server(StubCatalog::new(), Duration::from_millis(500));
    let auth = signed_in(&server, "ana@example.com").await;

    let mut response = reqwest::Client::new()
        .get(server.server_url("/api/v1/watchlist/count/stream").unwrap())
        .header(header::AUTHORIZATION, auth.clone())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let mut buffer = String::new();
    read_until(&mut response, &mut buffer, r#"{"count":0}"#).await;
    assert!(buffer.contains("event: count"));

    server
        .post("/api/v1/watchlist")
        .add_header(header::AUTHORIZATION, auth)
        .json(&json!({ "movie_id": 27205 }))
        .await
        .assert_status(StatusCode::CREATED);

    read_until(&mut response, &mut buffer, r#"{"count":1}"#).await;
}
