use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::admin::guard::AdminUser;
use crate::errors::AppError;
use crate::models::program::{Program, ProgramCreate, ProgramUpdate};
use crate::state::AppState;

/// POST /api/programs (admin)
pub async fn handle_create_program(
    State(state): State<AppState>,
    _admin: AdminUser,
    Json(create): Json<ProgramCreate>,
) -> Result<(StatusCode, Json<Program>), AppError> {
    if create.title.trim().is_empty() {
        return Err(AppError::Validation("title must not be empty".to_string()));
    }
    if create.institution.trim().is_empty() {
        return Err(AppError::Validation(
            "institution must not be empty".to_string(),
        ));
    }
    let program = state.programs.create(create).await?;
    Ok((StatusCode::CREATED, Json(program)))
}

/// GET /api/programs (admin)
pub async fn handle_list_programs(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<Vec<Program>>, AppError> {
    Ok(Json(state.programs.list().await?))
}

/// GET /api/programs/:id (admin)
pub async fn handle_get_program(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Program>, AppError> {
    let program = state
        .programs
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Program with ID {id} not found")))?;
    Ok(Json(program))
}

/// PUT /api/programs/:id (admin)
pub async fn handle_update_program(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    Json(update): Json<ProgramUpdate>,
) -> Result<Json<Program>, AppError> {
    let program = state
        .programs
        .update(id, update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Program with ID {id} not found")))?;
    Ok(Json(program))
}

/// DELETE /api/programs/:id (admin)
pub async fn handle_delete_program(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !state.programs.delete(id).await? {
        return Err(AppError::NotFound(format!("Program with ID {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}
