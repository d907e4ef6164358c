//! Bearer-token extractor for admin-only routes.

use axum::{async_trait, extract::FromRequestParts, http::header, http::request::Parts};

use crate::auth::{AuthError, AuthUser};
use crate::errors::AppError;
use crate::state::AppState;

/// Adding `AdminUser` as a handler argument makes the route admin-only:
/// the bearer token is verified against the auth provider and the user's
/// metadata role must be `admin`.
pub struct AdminUser(pub AuthUser);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or(AppError::Unauthorized)?;
        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AppError::Unauthorized)?;

        let user = state.auth.verify(token).await.map_err(|e| match e {
            AuthError::InvalidToken | AuthError::InvalidCredentials => AppError::Unauthorized,
            other => AppError::Auth(other),
        })?;

        if !user.is_admin() {
            return Err(AppError::Forbidden);
        }
        Ok(AdminUser(user))
    }
}
