/// OpenAI chat completions backend
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

use super::SuggestionBackend;

const TEMPERATURE: f32 = 0.7;

pub struct OpenAiBackend {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl OpenAiBackend {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_key,
            api_url: api_url.trim_end_matches('/').to_string(),
            model,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

impl ChatResponse {
    fn into_text(self) -> AppResult<String> {
        self.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| AppError::Generation("OpenAI reply had no content".to_string()))
    }
}

#[async_trait::async_trait]
impl SuggestionBackend for OpenAiBackend {
    async fn complete(&self, prompt: &str) -> AppResult<String> {
        let url = format!("{}/v1/chat/completions", self.api_url);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: TEMPERATURE,
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "OpenAI returned status {}: {}",
                status, body
            )));
        }

        let reply: ChatResponse = response.json().await?;
        reply.into_text()
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
