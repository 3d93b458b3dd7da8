use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};

use super::auth::AuthUser;
use crate::database::models::User;
use crate::error::ApiError;
use crate::state::AppState;

/// The caller's current user row, loaded after JWT validation
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Loads the user named by the token subject. A token for a deleted user is 401.
pub async fn validate_user_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_user = request
        .extensions()
        .get::<AuthUser>()
        .cloned()
        .ok_or_else(|| ApiError::unauthorized("JWT authentication required before user validation"))?;

    let user = state.storage.get_user(auth_user.user_id).await?.ok_or_else(|| {
        tracing::warn!("User validation failed: user {} no longer exists", auth_user.user_id);
        ApiError::unauthorized("User no longer exists")
    })?;

    tracing::debug!("User validation successful: {} ({})", user.id, user.role);

    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}
