/// TMDB catalog provider
///
/// Wraps the v3 REST API: `/search/movie`, `/trending/movie/{window}` and
/// `/movie/{id}`. Every response is cached in Redis.
use crate::{
    cached,
    db::{Cache, CacheKey},
    error::{AppError, AppResult},
    models::{CatalogMovie, MovieId, TmdbListResponse, TmdbMovie, TrendingWindow},
    services::catalog::Catalog,
};
use reqwest::{Client as HttpClient, StatusCode};
use serde::de::DeserializeOwned;

const SEARCH_CACHE_TTL: u64 = 3600; // 1 hour
const TRENDING_CACHE_TTL: u64 = 3600; // 1 hour
const DETAILS_CACHE_TTL: u64 = 604800; // 1 week
const TRENDING_LIMIT: usize = 8;
const LANGUAGE: &str = "en-US";

#[derive(Clone)]
pub struct TmdbCatalog {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    cache: Cache,
}

impl TmdbCatalog {
    pub fn new(cache: Cache, api_key: String, api_url: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            cache,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> AppResult<T> {
        let url = format!("{}{}", self.api_url, path);
        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", LANGUAGE)])
            .query(params)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("Catalog resource {}", path)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "TMDB returned status {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

#[async_trait::async_trait]
impl Catalog for TmdbCatalog {
    async fn search(&self, title: &str) -> AppResult<Vec<CatalogMovie>> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(Vec::new());
        }

        cached!(
            self.cache,
            CacheKey::MovieSearch(title.to_string()),
            SEARCH_CACHE_TTL,
            async move {
                let list: TmdbListResponse = self
                    .get_json("/search/movie", &[("query", title), ("page", "1")])
                    .await?;
                let movies: Vec<CatalogMovie> =
                    list.results.into_iter().map(CatalogMovie::from).collect();

                tracing::info!(
                    query = %title,
                    results = movies.len(),
                    provider = "tmdb",
                    "Movie search completed"
                );

                Ok::<_, AppError>(movies)
            }
        )
    }

    async fn trending(&self, window: TrendingWindow) -> AppResult<Vec<CatalogMovie>> {
        cached!(
            self.cache,
            CacheKey::Trending(window),
            TRENDING_CACHE_TTL,
            async move {
                let path = format!("/trending/movie/{}", window.as_str());
                let list: TmdbListResponse = self.get_json(&path, &[]).await?;
                let movies: Vec<CatalogMovie> = list
                    .results
                    .into_iter()
                    .take(TRENDING_LIMIT)
                    .map(CatalogMovie::from)
                    .collect();

                tracing::info!(
                    window = window.as_str(),
                    results = movies.len(),
                    provider = "tmdb",
                    "Trending movies fetched"
                );

                Ok::<_, AppError>(movies)
            }
        )
    }

    async fn details(&self, id: MovieId) -> AppResult<CatalogMovie> {
        cached!(
            self.cache,
            CacheKey::MovieDetails(id),
            DETAILS_CACHE_TTL,
            async move {
                let movie: TmdbMovie = self.get_json(&format!("/movie/{}", id), &[]).await?;
                tracing::debug!(movie_id = id, provider = "tmdb", "Movie details fetched");
                Ok::<_, AppError>(CatalogMovie::from(movie))
            }
        )
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}
