/// Anthropic messages backend
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

use super::SuggestionBackend;

const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 1024;

pub struct AnthropicBackend {
    http_client: HttpClient,
    api_key: String,
    api_url: String,
    model: String,
}

impl AnthropicBackend {
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
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl MessagesResponse {
    fn into_text(self) -> AppResult<String> {
        self.content
            .into_iter()
            .find(|block| block.kind == "text")
            .and_then(|block| block.text)
            .ok_or_else(|| AppError::Generation("Anthropic reply had no text block".to_string()))
    }
}

#[async_trait::async_trait]
impl SuggestionBackend for AnthropicBackend {
    async fn complete(&self, prompt: &str) -> AppResult<String> {
        let url = format!("{}/v1/messages", self.api_url);
        let body = MessagesRequest {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http_client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::ExternalApi(format!(
                "Anthropic returned status {}: {}",
                status, body
            )));
        }

        let reply: MessagesResponse = response.json().await?;
        reply.into_text()
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}
