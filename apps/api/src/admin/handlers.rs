use axum::{extract::State, Json};
use tracing::warn;

use crate::admin::guard::AdminUser;
use crate::errors::AppError;
use crate::models::admin::{
    AdminLogin, AdminLoginResponse, AdminProfile, AdminRegister, AdminRegisterResponse,
};
use crate::state::AppState;

/// POST /api/admin/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(login): Json<AdminLogin>,
) -> Result<Json<AdminLoginResponse>, AppError> {
    if login.email.trim().is_empty() || login.password.is_empty() {
        return Err(AppError::Validation(
            "email and password are required".to_string(),
        ));
    }

    // Any sign-in failure reads as bad credentials to the caller; the real
    // cause stays in the logs.
    let session = state
        .auth
        .sign_in(&login.email, &login.password)
        .await
        .map_err(|e| {
            warn!("admin login failed: {e}");
            AppError::Unauthorized
        })?;

    Ok(Json(AdminLoginResponse {
        id: session.user.id,
        email: session.user.email,
        access_token: session.access_token,
        token_type: session.token_type,
    }))
}

/// POST /api/admin/register
///
/// Only existing admins can create new admin users.
pub async fn handle_register(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(register): Json<AdminRegister>,
) -> Result<Json<AdminRegisterResponse>, AppError> {
    if !register.email.contains('@') {
        return Err(AppError::Validation(
            "email must be a valid address".to_string(),
        ));
    }
    if register.password.len() < 8 {
        return Err(AppError::Validation(
            "password must be at least 8 characters".to_string(),
        ));
    }

    let user = state
        .auth
        .sign_up(
            &register.email,
            &register.password,
            register.full_name.as_deref(),
        )
        .await
        .map_err(|e| AppError::Validation(format!("failed to register admin: {e}")))?;

    Ok(Json(AdminRegisterResponse {
        id: user.id,
        email: user.email,
        message: "Admin user created successfully".to_string(),
    }))
}

/// GET /api/admin/me
pub async fn handle_me(AdminUser(user): AdminUser) -> Json<AdminProfile> {
    Json(AdminProfile {
        id: user.id,
        email: user.email,
        full_name: user.full_name,
    })
}
