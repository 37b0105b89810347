use serde::Serialize;
use uuid::Uuid;

use crate::{
    db::{ChangeFeed, ChangeKind, Store, Table},
    error::{AppError, AppResult},
    models::{mean_rating, ListOrder, MovieId, Review, ReviewDraft, Session},
};

/// Summary of a user's reviews
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReviewStats {
    pub count: usize,
    pub average_rating: f64,
}

/// Creates the review, or replaces the user's existing review of the movie
pub async fn upsert(
    store: &dyn Store,
    changes: &ChangeFeed,
    session: &Session,
    draft: &ReviewDraft,
) -> AppResult<Review> {
    let user_id = session.user_id();
    let review = store.upsert_review(user_id, draft).await?;

    let kind = if review.created_at == review.updated_at {
        ChangeKind::Insert
    } else {
        ChangeKind::Update
    };
    changes.publish(Table::MovieReviews, user_id, kind);

    tracing::info!(user_id = %user_id, movie_id = draft.movie_id, "Review saved");
    Ok(review)
}

pub async fn list(store: &dyn Store, session: &Session, order: ListOrder) -> AppResult<Vec<Review>> {
    store.list_reviews(session.user_id(), order).await
}

pub async fn for_movie(
    store: &dyn Store,
    session: &Session,
    movie_id: MovieId,
) -> AppResult<Option<Review>> {
    store.review_for_movie(session.user_id(), movie_id).await
}

pub async fn delete(
    store: &dyn Store,
    changes: &ChangeFeed,
    session: &Session,
    review_id: Uuid,
) -> AppResult<()> {
    let user_id = session.user_id();
    if !store.delete_review(user_id, review_id).await? {
        return Err(AppError::NotFound(format!("Review {}", review_id)));
    }

    changes.publish(Table::MovieReviews, user_id, ChangeKind::Delete);
    Ok(())
}

pub async fn stats(store: &dyn Store, session: &Session) -> AppResult<ReviewStats> {
    let reviews = store
        .list_reviews(session.user_id(), ListOrder::default())
        .await?;

    Ok(ReviewStats {
        count: reviews.len(),
        average_rating: mean_rating(reviews.iter().map(|r| r.rating)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{AuthUser, Rating};

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

    fn draft(movie_id: MovieId, rating: f64, body: Option<&str>) -> ReviewDraft {
        ReviewDraft::new(
            movie_id,
            format!("Movie {}", movie_id),
            None,
            Some(Rating::new(rating).unwrap()),
            body.map(str::to_string),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_second_submission_replaces_first() {
        let store = MemoryStore::new();
        let changes = ChangeFeed::new();
        let session = session();

        let first = upsert(&store, &changes, &session, &draft(1, 2.0, Some("meh"))).await.unwrap();
        let second = upsert(&store, &changes, &session, &draft(1, 4.5, None)).await.unwrap();

        assert_eq!(first.id, second.id);
        let reviews = list(&store, &session, ListOrder::DateDesc).await.unwrap();
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews[0].rating, Rating::new(4.5).unwrap());
        assert_eq!(reviews[0].body, None);
    }

    #[tokio::test]
    async fn test_deleted_review_hidden() {
        let store = MemoryStore::new();
        let changes = ChangeFeed::new();
        let session = session();

        let review = upsert(&store, &changes, &session, &draft(5, 3.0, Some("ok"))).await.unwrap();
        delete(&store, &changes, &session, review.id).await.unwrap();

        assert!(list(&store, &session, ListOrder::DateDesc).await.unwrap().is_empty());
        assert!(for_movie(&store, &session, 5).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_stats_average() {
        let store = MemoryStore::new();
        let changes = ChangeFeed::new();
        let session = session();

        assert_eq!(
            stats(&store, &session).await.unwrap(),
            ReviewStats {
                count: 0,
                average_rating: 0.0
            }
        );

        upsert(&store, &changes, &session, &draft(1, 5.0, None)).await.unwrap();
        upsert(&store, &changes, &session, &draft(2, 4.5, None)).await.unwrap();
        upsert(&store, &changes, &session, &draft(3, 4.5, None)).await.unwrap();

        let stats = stats(&store, &session).await.unwrap();
        assert_eq!(stats.count, 3);
        assert_eq!(stats.average_rating, 4.7);
    }
}
