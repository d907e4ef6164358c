use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::student::{Student, StudentCreate, StudentUpdate};
use crate::state::AppState;

/// POST /api/students
pub async fn handle_create_student(
    State(state): State<AppState>,
    Json(create): Json<StudentCreate>,
) -> Result<(StatusCode, Json<Student>), AppError> {
    if create.name.trim().is_empty() {
        return Err(AppError::Validation("name must not be empty".to_string()));
    }
    if !create.email.contains('@') {
        return Err(AppError::Validation(
            "email must be a valid address".to_string(),
        ));
    }
    let student = state.students.create(create).await?;
    Ok((StatusCode::CREATED, Json(student)))
}

/// GET /api/students/:id
pub async fn handle_get_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Student>, AppError> {
    let student = state
        .students
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Student with ID {id} not found")))?;
    Ok(Json(student))
}

/// PUT /api/students/:id
pub async fn handle_update_student(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<StudentUpdate>,
) -> Result<Json<Student>, AppError> {
    if let Some(email) = &update.email {
        if !email.contains('@') {
            return Err(AppError::Validation(
                "email must be a valid address".to_string(),
            ));
        }
    }
    let student = state
        .students
        .update(id, update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Student with ID {id} not found")))?;
    Ok(Json(student))
}
