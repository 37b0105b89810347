/// Search-as-you-type with a quiet period
///
/// Every submission takes the next sequence number. A submission only reaches
/// the catalog if no newer one arrived during its delay, and results are
/// published only when they are newer than what was last published, so a slow
/// response can never overwrite a fresher one.
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::watch;

use crate::{models::CatalogMovie, services::catalog::Catalog};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SearchResults {
    pub seq: u64,
    pub query: String,
    pub movies: Vec<CatalogMovie>,
}

pub struct DebouncedSearch {
    catalog: Arc<dyn Catalog>,
    delay: Duration,
    latest: Arc<AtomicU64>,
    results: Arc<watch::Sender<Option<SearchResults>>>,
}

impl DebouncedSearch {
    pub fn new(
        catalog: Arc<dyn Catalog>,
        delay: Duration,
    ) -> (Self, watch::Receiver<Option<SearchResults>>) {
        let (tx, rx) = watch::channel(None);
        let search = Self {
            catalog,
            delay,
            latest: Arc::new(AtomicU64::new(0)),
            results: Arc::new(tx),
        };
        (search, rx)
    }

    /// Queues `query`, superseding any submission still waiting out its delay
    pub fn submit(&self, query: impl Into<String>) -> u64 {
        let query = query.into();
        let seq = self.latest.fetch_add(1, Ordering::SeqCst) + 1;

        let catalog = Arc::clone(&self.catalog);
        let latest = Arc::clone(&self.latest);
        let results = Arc::clone(&self.results);
        let delay = self.delay;

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if latest.load(Ordering::SeqCst) != seq {
                return;
            }

            let movies = if query.trim().is_empty() {
                Vec::new()
            } else {
                match catalog.search(&query).await {
                    Ok(movies) => movies,
                    Err(e) => {
                        tracing::warn!(error = %e, query = %query, seq, "Live search failed");
                        return;
                    }
                }
            };

            let published = results.send_if_modified(|current| {
                if current.as_ref().is_some_and(|c| c.seq >= seq) {
                    return false;
                }
                *current = Some(SearchResults {
                    seq,
                    query: query.clone(),
                    movies,
                });
                true
            });

            if !published {
                tracing::debug!(query = %query, seq, "Discarded stale search response");
            }
        });

        seq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppResult;
    use crate::models::{MovieId, TrendingWindow};
    use crate::services::catalog::MockCatalog;

    const DELAY: Duration = Duration::from_millis(500);

    fn movie(title: &str) -> CatalogMovie {
        CatalogMovie {
            id: title.len() as MovieId,
            title: title.to_string(),
            poster_path: None,
            release_date: None,
            overview: None,
            genre_ids: vec![],
        }
    }

    /// Answers instantly except for queries listed as slow
    struct LaggyCatalog {
        slow: &'static str,
        lag: Duration,
    }

    #[async_trait::async_trait]
    impl Catalog for LaggyCatalog {
        async fn search(&self, title: &str) -> AppResult<Vec<CatalogMovie>> {
            if title == self.slow {
                tokio::time::sleep(self.lag).await;
            }
            Ok(vec![movie(title)])
        }

        async fn trending(&self, _window: TrendingWindow) -> AppResult<Vec<CatalogMovie>> {
            Ok(vec![])
        }

        async fn details(&self, id: MovieId) -> AppResult<CatalogMovie> {
            Ok(movie(&id.to_string()))
        }

        fn name(&self) -> &'static str {
            "laggy"
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_keystrokes_within_delay_issue_one_search() {
        let mut catalog = MockCatalog::new();
        catalog
            .expect_search()
            .withf(|title: &str| title == "Inception")
            .times(1)
            .returning(|title| Ok(vec![movie(title)]));

        let (search, mut rx) = DebouncedSearch::new(Arc::new(catalog), DELAY);

        search.submit("Incep");
        tokio::time::sleep(Duration::from_millis(200)).await;
        let seq = search.submit("Inception");

        rx.changed().await.unwrap();
        let results = rx.borrow().clone().unwrap();
        assert_eq!(results.seq, seq);
        assert_eq!(results.query, "Inception");

        // Let the superseded timer fire; the mock fails on a second call
        tokio::time::sleep(DELAY * 2).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_discarded() {
        let catalog = LaggyCatalog {
            slow: "Incep",
            lag: Duration::from_secs(2),
        };
        let (search, mut rx) = DebouncedSearch::new(Arc::new(catalog), DELAY);

        search.submit("Incep");
        tokio::time::sleep(Duration::from_millis(600)).await;
        search.submit("Inception");

        rx.changed().await.unwrap();
        assert_eq!(rx.borrow().as_ref().unwrap().query, "Inception");

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(!rx.has_changed().unwrap());
        assert_eq!(rx.borrow().as_ref().unwrap().query, "Inception");
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_query_clears_without_search() {
        let mut catalog = MockCatalog::new();
        catalog.expect_search().times(0);

        let (search, mut rx) = DebouncedSearch::new(Arc::new(catalog), DELAY);
        search.submit("  ");

        rx.changed().await.unwrap();
        assert!(rx.borrow().as_ref().unwrap().movies.is_empty());
    }
}
