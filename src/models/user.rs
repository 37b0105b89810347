use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::MovieId;
use crate::error::AppError;

const MIN_PASSWORD_LEN: usize = 6;

/// Identity as reported by the auth service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// Public profile row, created at sign-up
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

/// Per-user recommendation preferences
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UserPreferences {
    /// Movies excluded from recommendations, in the order they were marked
    pub not_interested_movies: Vec<MovieId>,
}

/// The signed-in user a request acts on behalf of
///
/// Created from a bearer token at the edge of every authenticated request and
/// passed explicitly into the services; nothing else mutates it.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Session {
    pub user: AuthUser,
    pub profile: Option<Profile>,
    #[serde(skip)]
    pub access_token: String,
}

impl Session {
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }
}

/// Tokens handed back by a successful sign-in
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    pub user: AuthUser,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignUpRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub username: String,
}

impl SignUpRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.email.trim().is_empty()
            || self.password.is_empty()
            || self.username.trim().is_empty()
        {
            return Err(AppError::InvalidInput("All fields are required".to_string()));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::InvalidInput(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl SignInRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.email.trim().is_empty() || self.password.is_empty() {
            return Err(AppError::InvalidInput(
                "Email and password are required".to_string(),
            ));
        }
        Ok(())
    }
}
