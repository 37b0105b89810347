use serde::Serialize;

use crate::{
    db::Store,
    error::AppResult,
    models::{mean_rating, ListOrder, Profile, Session, WatchedMovie},
};

const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProfileStats {
    pub watchlist_count: i64,
    pub watched_count: usize,
    /// Mean over watched movies, one decimal; 0.0 when nothing is watched
    pub average_rating: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileOverview {
    pub profile: Option<Profile>,
    pub stats: ProfileStats,
    pub recent_movies: Vec<WatchedMovie>,
}

pub async fn overview(store: &dyn Store, session: &Session) -> AppResult<ProfileOverview> {
    let user_id = session.user_id();

    let profile = match &session.profile {
        Some(profile) => Some(profile.clone()),
        None => store.get_profile(user_id).await?,
    };
    let watchlist_count = store.count_watchlist(user_id).await?;
    let mut watched = store.list_watched(user_id, ListOrder::DateDesc).await?;

    let stats = ProfileStats {
        watchlist_count,
        watched_count: watched.len(),
        average_rating: mean_rating(watched.iter().map(|w| w.rating)),
    };
    watched.truncate(RECENT_LIMIT);

    Ok(ProfileOverview {
        profile,
        stats,
        recent_movies: watched,
    })
}
