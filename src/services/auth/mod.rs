/// Identity provider integration
///
/// The provider owns credentials and tokens; profiles and preferences live in
/// the `Store` and are provisioned by `services::session`.
use crate::{
    error::AppResult,
    models::{AuthTokens, AuthUser},
};

pub mod gotrue;

pub use gotrue::GoTrueAuth;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait AuthProvider: Send + Sync {
    /// Registers a new account
    async fn sign_up(&self, email: &str, password: &str) -> AppResult<AuthUser>;

    /// Exchanges credentials for tokens; bad credentials are `Unauthorized`
    async fn sign_in(&self, email: &str, password: &str) -> AppResult<AuthTokens>;

    /// Resolves an access token to its user; unknown or expired tokens are `Unauthorized`
    async fn user_for_token(&self, access_token: &str) -> AppResult<AuthUser>;

    async fn sign_out(&self, access_token: &str) -> AppResult<()>;
}
