//! Token-auth seam for the hosted auth service.
//!
//! `AppState` holds an `Arc<dyn AuthProvider>`; the hosted implementation
//! lives in `store::supabase`, the static-token one in `store::memory`.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid or expired token")]
    InvalidToken,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("auth API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("auth response decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// An authenticated user as reported by the auth service.
#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub role: Option<String>,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.role.as_deref() == Some("admin")
    }
}

/// A signed-in session: the user plus the bearer token to present on
/// subsequent requests.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: AuthUser,
    pub access_token: String,
    pub token_type: String,
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Email + password sign-in. Wrong credentials map to
    /// `AuthError::InvalidCredentials`, not a generic API error.
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// Registers a new admin user with the auth service.
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        full_name: Option<&str>,
    ) -> Result<AuthUser, AuthError>;

    /// Validates a bearer token and returns the user it belongs to.
    async fn verify(&self, token: &str) -> Result<AuthUser, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_admin_requires_admin_role() {
        let user = AuthUser {
            id: "u1".to_string(),
            email: "a@x.com".to_string(),
            full_name: None,
            role: Some("admin".to_string()),
        };
        assert!(user.is_admin());
    }

    #[test]
    fn test_is_admin_false_for_other_or_missing_role() {
        let mut user = AuthUser {
            id: "u1".to_string(),
            email: "a@x.com".to_string(),
            full_name: None,
            role: Some("student".to_string()),
        };
        assert!(!user.is_admin());
        user.role = None;
        assert!(!user.is_admin());
    }
}
