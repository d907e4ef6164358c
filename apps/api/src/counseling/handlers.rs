use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};
use uuid::Uuid;

use crate::counseling::extract::{extract_profile_details, ExtractedDetails};
use crate::counseling::orchestrator::{handle_turn, TurnOutcome};
use crate::errors::AppError;
use crate::models::student::{ConversationTurn, TurnRole};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ConversationInput {
    pub text: String,
}

/// Chat responses always come back 200 once the student exists; gateway
/// failures surface through the `success` flag, not an HTTP error.
#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/students/:id/conversation
pub async fn handle_conversation(
    State(state): State<AppState>,
    Path(student_id): Path<Uuid>,
    Json(input): Json<ConversationInput>,
) -> Result<Json<ConversationResponse>, AppError> {
    let outcome = handle_turn(
        &state.students,
        &state.programs,
        state.gateway.as_ref(),
        &state.cache,
        student_id,
        &input.text,
    )
    .await?;

    Ok(Json(match outcome {
        TurnOutcome::Success { response } => ConversationResponse {
            success: true,
            response: Some(response),
            error: None,
        },
        TurnOutcome::Degraded { error } => ConversationResponse {
            success: false,
            response: None,
            error: Some(error),
        },
    }))
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted: Option<ExtractedDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// POST /api/students/:id/analyze
///
/// Extracts structured profile details from free text and applies them as a
/// partial update. Same always-200 contract as the conversation endpoint.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Path(student_id): Path<Uuid>,
    Json(input): Json<ConversationInput>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let text = input.text.trim();
    if text.is_empty() {
        return Err(AppError::Validation(
            "message text must not be empty".to_string(),
        ));
    }

    state
        .students
        .get(student_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Student with ID {student_id} not found")))?;

    let user_turn = ConversationTurn::now(TurnRole::User, text);
    state.cache.push(student_id, user_turn.clone());
    if let Err(e) = state.students.append_turn(student_id, user_turn).await {
        warn!(%student_id, "failed to persist inbound turn: {e}");
        state.cache.invalidate(student_id);
    }

    match extract_profile_details(state.gateway.as_ref(), text).await {
        Ok(details) => {
            if !details.is_empty() {
                state
                    .students
                    .update(student_id, details.clone().into_update())
                    .await?;
            }
            let confirmation = ConversationTurn::now(
                TurnRole::Assistant,
                "Thank you for providing this information. I've updated your profile with these details.",
            );
            state.cache.push(student_id, confirmation.clone());
            state.students.append_turn(student_id, confirmation).await?;
            Ok(Json(AnalyzeResponse {
                success: true,
                extracted: Some(details),
                error: None,
            }))
        }
        Err(e) => {
            error!(%student_id, "profile extraction failed: {e}");
            let note =
                ConversationTurn::now(TurnRole::System, format!("Error processing input: {e}"));
            state.cache.push(student_id, note.clone());
            if let Err(persist) = state.students.append_turn(student_id, note).await {
                warn!(%student_id, "failed to record extraction error turn: {persist}");
                state.cache.invalidate(student_id);
            }
            Ok(Json(AnalyzeResponse {
                success: false,
                extracted: None,
                error: Some(e.to_string()),
            }))
        }
    }
}
