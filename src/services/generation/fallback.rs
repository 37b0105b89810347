use crate::models::{PromptContext, SuggestionCandidate};

/// Canned titles keyed by the genre words a request may mention
const GENRE_TITLES: &[(&[&str], &str, [&str; 4])] = &[
    (
        &["action"],
        "action",
        ["Mad Max Fury Road", "John Wick", "Mission Impossible", "The Dark Knight"],
    ),
    (
        &["romantic", "romance"],
        "romance",
        ["The Notebook", "Pride and Prejudice", "La La Land", "About Time"],
    ),
    (
        &["comedy"],
        "comedy",
        ["The Grand Budapest Hotel", "Superbad", "The Big Lebowski", "Knives Out"],
    ),
    (
        &["sci-fi", "science fiction"],
        "sci-fi",
        ["Inception", "Interstellar", "The Matrix", "Arrival"],
    ),
    (
        &["horror"],
        "horror",
        ["The Conjuring", "Get Out", "A Quiet Place", "Hereditary"],
    ),
    (
        &["drama"],
        "drama",
        ["The Shawshank Redemption", "Forrest Gump", "The Godfather", "Parasite"],
    ),
];

const DEFAULT_TITLES: [&str; 4] = [
    "The Shawshank Redemption",
    "The Dark Knight",
    "Inception",
    "Interstellar",
];

/// Keyword-matched stand-in for a model when no backend is configured
pub fn candidates(context: &PromptContext) -> Vec<SuggestionCandidate> {
    let query = context.query().map(str::to_lowercase);

    let matched = query.as_deref().and_then(|q| {
        GENRE_TITLES
            .iter()
            .find(|(keywords, _, _)| keywords.iter().any(|k| q.contains(k)))
    });

    let (titles, reason) = match (matched, &query) {
        (Some((_, genre, titles)), _) => {
            (titles, format!("Popular {} movie matching your query", genre))
        }
        (None, Some(_)) => (&DEFAULT_TITLES, "Popular movie matching your query".to_string()),
        (None, None) => (&DEFAULT_TITLES, "Popular movie you might enjoy".to_string()),
    };

    titles
        .iter()
        .map(|title| SuggestionCandidate {
            title: title.to_string(),
            year: None,
            reason: reason.clone(),
        })
        .collect()
}
