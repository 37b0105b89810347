use serde::{Deserialize, Serialize};

use super::{CatalogMovie, Rating};

/// A movie reference proposed by the generator, not yet resolved against the catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SuggestionCandidate {
    pub title: String,
    pub year: Option<i32>,
    pub reason: String,
}

/// A resolved catalog movie carrying the reason it was recommended
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct EnrichedMovie {
    pub movie: CatalogMovie,
    pub reason: String,
}

/// A highly rated watched movie used to steer generation
#[derive(Debug, Clone, PartialEq)]
pub struct LikedMovie {
    pub title: String,
    pub rating: Rating,
}

/// What the generator is asked to base its suggestions on
#[derive(Debug, Clone, PartialEq)]
pub enum PromptContext {
    /// Free-text request, optionally steered by the user's favourites
    Query { text: String, liked: Vec<LikedMovie> },
    /// No request text; suggestions come from the favourites alone
    History { liked: Vec<LikedMovie> },
}

impl PromptContext {
    pub fn liked(&self) -> &[LikedMovie] {
        match self {
            PromptContext::Query { liked, .. } | PromptContext::History { liked } => liked,
        }
    }

    pub fn query(&self) -> Option<&str> {
        match self {
            PromptContext::Query { text, .. } => Some(text),
            PromptContext::History { .. } => None,
        }
    }
}
