/// GoTrue-compatible REST client
use reqwest::{Client as HttpClient, RequestBuilder, Response};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{AuthTokens, AuthUser},
    services::auth::AuthProvider,
};

#[derive(Clone)]
pub struct GoTrueAuth {
    http_client: HttpClient,
    api_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
}

/// `/signup` answers with `{ "user": {...} }` when a session is issued and
/// with the bare user object when email confirmation is pending.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SignUpResponse {
    Wrapped { user: AuthUser },
    Bare(AuthUser),
}

impl From<SignUpResponse> for AuthUser {
    fn from(response: SignUpResponse) -> Self {
        match response {
            SignUpResponse::Wrapped { user } | SignUpResponse::Bare(user) => user,
        }
    }
}

impl GoTrueAuth {
    pub fn new(api_url: String, api_key: String) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn request(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("apikey", &self.api_key)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Maps client errors through `rejection` and everything else to `ExternalApi`
    async fn check(response: Response, action: &str) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status.is_client_error() {
            tracing::warn!(status = %status, action, "Auth request rejected");
            return Err(rejection(action, auth_error_message(&body, action)));
        }

        Err(AppError::ExternalApi(format!(
            "Auth service returned status {} during {}: {}",
            status, action, body
        )))
    }
}

/// Credential and token failures are `Unauthorized`; a rejected sign-up is
/// bad input such as a weak password or an address already registered
fn rejection(action: &str, message: String) -> AppError {
    match action {
        "sign in" | "session lookup" | "sign out" => AppError::Unauthorized(message),
        _ => AppError::InvalidInput(message),
    }
}

/// Pulls a human-readable message out of a GoTrue error body
fn auth_error_message(body: &str, action: &str) -> String {
    #[derive(Deserialize)]
    struct ErrorBody {
        #[serde(alias = "error_description", alias = "message")]
        msg: Option<String>,
    }

    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.msg)
        .unwrap_or_else(|| format!("{} failed", action))
}

#[async_trait::async_trait]
impl AuthProvider for GoTrueAuth {
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<AuthUser> {
        let response = self
            .request(self.http_client.post(self.url("/signup")))
            .json(&Credentials { email, password })
            .send()
            .await?;

        let response = Self::check(response, "sign up").await?;
        let user: SignUpResponse = response.json().await?;
        Ok(user.into())
    }

    async fn sign_in(&self, email: &str, password: &str) -> AppResult<AuthTokens> {
        let response = self
            .request(self.http_client.post(self.url("/token")))
            .query(&[("grant_type", "password")])
            .json(&Credentials { email, password })
            .send()
            .await?;

        let response = Self::check(response, "sign in").await?;
        Ok(response.json().await?)
    }

    async fn user_for_token(&self, access_token: &str) -> AppResult<AuthUser> {
        let response = self
            .request(self.http_client.get(self.url("/user")))
            .bearer_auth(access_token)
            .send()
            .await?;

        let response = Self::check(response, "session lookup").await?;
        Ok(response.json().await?)
    }

    async fn sign_out(&self, access_token: &str) -> AppResult<()> {
        let response = self
            .request(self.http_client.post(self.url("/logout")))
            .bearer_auth(access_token)
            .send()
            .await?;

        Self::check(response, "sign out").await?;
        Ok(())
    }
}
