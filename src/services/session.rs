use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{AuthTokens, Profile, Session, SignInRequest, SignUpRequest},
    services::auth::AuthProvider,
};

/// Registers an account and provisions its profile and empty preferences
pub async fn sign_up(
    store: &dyn Store,
    auth: &dyn AuthProvider,
    request: &SignUpRequest,
) -> AppResult<Profile> {
    request.validate()?;

    let user = auth.sign_up(request.email.trim(), &request.password).await?;
    let profile = store
        .create_profile(user.id, request.username.trim())
        .await?;
    store.create_preferences(user.id).await?;

    tracing::info!(user_id = %user.id, "User signed up");
    Ok(profile)
}

pub async fn sign_in(
    store: &dyn Store,
    auth: &dyn AuthProvider,
    request: &SignInRequest,
) -> AppResult<(AuthTokens, Session)> {
    request.validate()?;

    let tokens = auth.sign_in(request.email.trim(), &request.password).await?;
    let session = Session {
        user: tokens.user.clone(),
        profile: store.get_profile(tokens.user.id).await?,
        access_token: tokens.access_token.clone(),
    };

    tracing::info!(user_id = %session.user_id(), "User signed in");
    Ok((tokens, session))
}

/// Resolves a bearer token into the session it belongs to
pub async fn resolve(
    store: &dyn Store,
    auth: &dyn AuthProvider,
    access_token: &str,
) -> AppResult<Session> {
    if access_token.trim().is_empty() {
        return Err(AppError::Unauthorized("Missing access token".to_string()));
    }

    let user = auth.user_for_token(access_token).await?;
    let profile = store.get_profile(user.id).await?;

    Ok(Session {
        user,
        profile,
        access_token: access_token.to_string(),
    })
}

pub async fn sign_out(auth: &dyn AuthProvider, session: Session) -> AppResult<()> {
    let user_id = session.user_id();
    auth.sign_out(&session.access_token).await?;
    tracing::info!(user_id = %user_id, "User signed out");
    Ok(())
}
