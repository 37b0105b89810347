use std::collections::HashSet;

use crate::{
    db::{ChangeFeed, ChangeKind, Store, Table},
    error::{AppError, AppResult},
    models::{
        EnrichedMovie, LikedMovie, MovieId, PromptContext, Rating, Session, SuggestionCandidate,
        UserPreferences,
    },
    services::{catalog::Catalog, generation::SuggestionGenerator},
};

/// Most recommendations returned for one request
pub const MAX_RECOMMENDATIONS: usize = 8;

/// Most favourites embedded in a prompt
pub const LIKED_LIMIT: usize = 10;

/// Canned requests offered next to the free-text box
pub const QUICK_PROMPTS: [&str; 6] = [
    "Suggest action movies released after 2020",
    "What are some good romantic comedies?",
    "Show me sci-fi movies with mind-bending plots",
    "Recommend critically acclaimed dramas",
    "What horror movies are worth watching?",
    "Suggest family-friendly animated movies",
];

/// Generates and resolves recommendations for the session's user
///
/// `query` of `None` asks for suggestions based on the watch history alone,
/// which requires at least one watched movie rated 4.0 or higher.
pub async fn recommend(
    store: &dyn Store,
    catalog: &dyn Catalog,
    generator: &SuggestionGenerator,
    session: &Session,
    query: Option<&str>,
) -> AppResult<Vec<EnrichedMovie>> {
    let user_id = session.user_id();

    let query = match query.map(str::trim) {
        Some("") => {
            return Err(AppError::InvalidInput(
                "Please enter what you're looking for".to_string(),
            ))
        }
        other => other,
    };

    let liked: Vec<LikedMovie> = store
        .top_rated_watched(user_id, Rating::LIKED_THRESHOLD, LIKED_LIMIT)
        .await?
        .into_iter()
        .map(|w| LikedMovie {
            title: w.movie.title,
            rating: w.rating,
        })
        .collect();

    let context = match query {
        Some(text) => PromptContext::Query {
            text: text.to_string(),
            liked,
        },
        None if liked.is_empty() => {
            return Err(AppError::InvalidInput(
                "Rate some movies 4 stars or higher to get history-based recommendations"
                    .to_string(),
            ))
        }
        None => PromptContext::History { liked },
    };

    let excluded: HashSet<MovieId> = store
        .get_preferences(user_id)
        .await?
        .not_interested_movies
        .into_iter()
        .collect();

    let candidates = generator.generate(&context).await?;
    let recommendations = build_recommendations(catalog, &candidates, &excluded).await;

    tracing::info!(
        user_id = %user_id,
        backend = generator.backend_name(),
        candidates = candidates.len(),
        results = recommendations.len(),
        "Recommendations built"
    );

    Ok(recommendations)
}

/// Resolves candidates against the catalog in generator order
///
/// Each candidate takes the first search hit. Unresolvable titles, excluded
/// ids and repeats of an already accepted id are dropped; resolution stops once
/// `MAX_RECOMMENDATIONS` movies are accepted.
pub async fn build_recommendations(
    catalog: &dyn Catalog,
    candidates: &[SuggestionCandidate],
    excluded: &HashSet<MovieId>,
) -> Vec<EnrichedMovie> {
    let mut seen = HashSet::new();
    let mut accepted = Vec::new();

    for candidate in candidates {
        if accepted.len() >= MAX_RECOMMENDATIONS {
            break;
        }

        let movie = match catalog.search(&candidate.title).await {
            Ok(results) => match results.into_iter().next() {
                Some(movie) => movie,
                None => {
                    tracing::debug!(title = %candidate.title, "Suggestion not found in catalog");
                    continue;
                }
            },
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    title = %candidate.title,
                    provider = catalog.name(),
                    "Catalog search failed for suggestion"
                );
                continue;
            }
        };

        if excluded.contains(&movie.id) || !seen.insert(movie.id) {
            continue;
        }

        accepted.push(EnrichedMovie {
            movie,
            reason: candidate.reason.clone(),
        });
    }

    accepted
}

/// Excludes a movie from future recommendations
pub async fn mark_not_interested(
    store: &dyn Store,
    changes: &ChangeFeed,
    session: &Session,
    movie_id: MovieId,
) -> AppResult<UserPreferences> {
    let user_id = session.user_id();
    let preferences = store.append_not_interested(user_id, movie_id).await?;

    changes.publish(Table::UserPreferences, user_id, ChangeKind::Update);
    tracing::info!(user_id = %user_id, movie_id, "Movie marked not interested");

    Ok(preferences)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{AuthUser, CatalogMovie, MovieSnapshot};
    use crate::services::catalog::MockCatalog;
    use uuid::Uuid;

    fn session() -> Session {
        Session {
            user: AuthUser {
                id: Uuid::new_v4(),
                email: None,
            },
            profile: None,
            access_token: "token".to_string(),
        }
    }

    fn movie(id: MovieId, title: &str) -> CatalogMovie {
        CatalogMovie {
            id,
            title: title.to_string(),
            poster_path: None,
            release_date: None,
            overview: None,
            genre_ids: vec![],
        }
    }

    fn candidate(title: &str) -> SuggestionCandidate {
        SuggestionCandidate {
            title: title.to_string(),
            year: None,
            reason: format!("Because {}", title),
        }
    }

    /// Catalog where "Movie N" resolves to id N and anything else finds nothing
    fn numbered_catalog() -> MockCatalog {
        let mut catalog = MockCatalog::new();
        catalog.expect_search().returning(|title| {
            Ok(title
                .strip_prefix("Movie ")
                .and_then(|n| n.parse().ok())
                .map(|id| vec![movie(id, title)])
                .unwrap_or_default())
        });
        catalog.expect_name().return_const("mock");
        catalog
    }

    #[tokio::test]
    async fn test_unresolvable_title_dropped() {
        let mut catalog = MockCatalog::new();
        catalog.expect_search().returning(|title| {
            if title == "Inception" {
                Ok(vec![movie(27205, "Inception"), movie(1, "Inception: The Cobol Job")])
            } else {
                Ok(vec![])
            }
        });

        let candidates = vec![candidate("Nonexistent Movie XYZ"), candidate("Inception")];
        let result = build_recommendations(&catalog, &candidates, &HashSet::new()).await;

        assert_eq!(result.len(), 1);
        assert_eq!(result[0].movie.id, 27205);
        assert_eq!(result[0].reason, "Because Inception");
    }

    #[tokio::test]
    async fn test_never_more_than_eight() {
        let catalog = numbered_catalog();
        let candidates: Vec<_> = (1..=12).map(|n| candidate(&format!("Movie {}", n))).collect();

        let result = build_recommendations(&catalog, &candidates, &HashSet::new()).await;

        assert_eq!(result.len(), MAX_RECOMMENDATIONS);
        assert_eq!(result.last().unwrap().movie.id, 8);
    }

    #[tokio::test]
    async fn test_duplicates_and_excluded_dropped() {
        let catalog = numbered_catalog();
        let candidates = vec![
            candidate("Movie 1"),
            candidate("Movie 2"),
            candidate("Movie 1"),
            candidate("Movie 3"),
        ];
        let excluded = HashSet::from([2]);

        let result = build_recommendations(&catalog, &candidates, &excluded).await;
        let ids: Vec<MovieId> = result.iter().map(|r| r.movie.id).collect();

        assert_eq!(ids, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_search_failure_skips_candidate() {
        let mut catalog = MockCatalog::new();
        catalog.expect_search().returning(|title| {
            if title == "Heat" {
                Err(AppError::ExternalApi("timeout".to_string()))
            } else {
                Ok(vec![movie(949, "Arrival")])
            }
        });
        catalog.expect_name().return_const("mock");

        let result =
            build_recommendations(&catalog, &[candidate("Heat"), candidate("Arrival")], &HashSet::new())
                .await;
        assert_eq!(result.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_query_rejected_before_generation() {
        let store = MemoryStore::new();
        let mut catalog = MockCatalog::new();
        catalog.expect_search().times(0);
        let generator = SuggestionGenerator::new(None);

        let result = recommend(&store, &catalog, &generator, &session(), Some("   ")).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_history_mode_requires_liked_movies() {
        let store = MemoryStore::new();
        let session = session();
        let snapshot = MovieSnapshot::from(&movie(1, "Meh"));
        store
            .record_watched(session.user_id(), &snapshot, Rating::new(3.5).unwrap())
            .await
            .unwrap();

        let catalog = MockCatalog::new();
        let generator = SuggestionGenerator::new(None);

        let result = recommend(&store, &catalog, &generator, &session, None).await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_not_interested_excluded_from_next_fetch() {
        let store = MemoryStore::new();
        let changes = ChangeFeed::new();
        let session = session();

        let mut catalog = MockCatalog::new();
        catalog.expect_search().returning(|title| {
            let id = match title {
                "Mad Max Fury Road" => 76341,
                "John Wick" => 245891,
                "Mission Impossible" => 954,
                _ => 155,
            };
            Ok(vec![movie(id, title)])
        });
        catalog.expect_name().return_const("mock");
        let generator = SuggestionGenerator::new(None);

        let query = Some("action please");
        let before = recommend(&store, &catalog, &generator, &session, query).await.unwrap();
        assert!(before.iter().any(|r| r.movie.id == 245891));

        let prefs = mark_not_interested(&store, &changes, &session, 245891).await.unwrap();
        assert_eq!(prefs.not_interested_movies, vec![245891]);

        let after = recommend(&store, &catalog, &generator, &session, query).await.unwrap();
        assert_eq!(after.len(), before.len() - 1);
        assert!(after.iter().all(|r| r.movie.id != 245891));
    }

    #[tokio::test]
    async fn test_mark_not_interested_is_idempotent() {
        let store = MemoryStore::new();
        let changes = ChangeFeed::new();
        let session = session();

        mark_not_interested(&store, &changes, &session, 7).await.unwrap();
        let prefs = mark_not_interested(&store, &changes, &session, 7).await.unwrap();

        assert_eq!(prefs.not_interested_movies, vec![7]);
    }
}
