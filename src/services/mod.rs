pub mod auth;
pub mod catalog;
pub mod generation;
pub mod live_search;
pub mod profile;
pub mod recommendations;
pub mod reviews;
pub mod session;
pub mod watched;
pub mod watchlist;

pub use auth::{AuthProvider, GoTrueAuth};
pub use catalog::{Catalog, PosterUrls, TmdbCatalog};
pub use generation::SuggestionGenerator;
pub use live_search::DebouncedSearch;
