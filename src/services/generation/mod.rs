/// Suggestion generation
///
/// A single prompt goes to one text-generation backend, and the reply is parsed
/// into at most eight `SuggestionCandidate`s. Without a configured backend a
/// keyword table stands in for the model.
use std::sync::Arc;

use crate::{
    config::Config,
    error::AppResult,
    models::{PromptContext, SuggestionCandidate},
};

pub mod anthropic;
pub mod fallback;
pub mod openai;
pub mod parse;

pub use anthropic::AnthropicBackend;
pub use openai::OpenAiBackend;

/// Upper bound on candidates taken from one generation
pub const MAX_SUGGESTIONS: usize = 8;

/// Longest reason kept per candidate, in words
pub const MAX_REASON_WORDS: usize = 30;

const HISTORY_REQUEST: &str = "Recommend movies I would enjoy based on what I have liked.";

/// Single-turn prompt-in, text-out language model API
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SuggestionBackend: Send + Sync {
    async fn complete(&self, prompt: &str) -> AppResult<String>;

    /// Provider name for logging
    fn name(&self) -> &'static str;
}

/// Turns a prompt context into suggestion candidates
pub struct SuggestionGenerator {
    backend: Option<Arc<dyn SuggestionBackend>>,
}

impl SuggestionGenerator {
    pub fn new(backend: Option<Arc<dyn SuggestionBackend>>) -> Self {
        Self { backend }
    }

    /// Picks the backend whose credential is configured, OpenAI first
    pub fn from_config(config: &Config) -> Self {
        let backend: Option<Arc<dyn SuggestionBackend>> =
            match (&config.openai_api_key, &config.anthropic_api_key) {
                (Some(key), _) if !key.is_empty() => Some(Arc::new(OpenAiBackend::new(
                    key.clone(),
                    config.openai_api_url.clone(),
                    config.openai_model.clone(),
                ))),
                (_, Some(key)) if !key.is_empty() => Some(Arc::new(AnthropicBackend::new(
                    key.clone(),
                    config.anthropic_api_url.clone(),
                    config.anthropic_model.clone(),
                ))),
                _ => None,
            };

        match &backend {
            Some(b) => tracing::info!(backend = b.name(), "Suggestion backend configured"),
            None => tracing::warn!("No generation credential configured, using fallback titles"),
        }

        Self::new(backend)
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.as_ref().map_or("fallback", |b| b.name())
    }

    /// Produces candidates in the order the backend ranked them
    ///
    /// Transport failures and replies without a parseable list abort the whole
    /// generation; individual malformed entries are dropped.
    pub async fn generate(&self, context: &PromptContext) -> AppResult<Vec<SuggestionCandidate>> {
        let Some(backend) = &self.backend else {
            return Ok(fallback::candidates(context));
        };

        let prompt = build_prompt(context);
        let raw = backend.complete(&prompt).await?;
        let candidates = parse::parse_candidates(&raw)?;

        tracing::info!(
            backend = backend.name(),
            candidates = candidates.len(),
            "Suggestions generated"
        );

        Ok(candidates)
    }
}

/// Builds the single prompt sent to the backend
pub fn build_prompt(context: &PromptContext) -> String {
    let request = context.query().unwrap_or(HISTORY_REQUEST);

    let liked = context.liked();
    let history = if liked.is_empty() {
        String::new()
    } else {
        let titles: Vec<String> = liked
            .iter()
            .map(|m| format!("{} ({}★)", m.title, m.rating))
            .collect();
        format!(" User has enjoyed: {}.", titles.join(", "))
    };

    format!(
        "{}{} Suggest {} movies. For each movie, provide: 1) The exact movie title, \
         2) Release year, 3) A brief explanation (max {} words) of why it's recommended. \
         Format as JSON array with objects containing: title, year, reason.",
        request, history, MAX_SUGGESTIONS, MAX_REASON_WORDS
    )
}
