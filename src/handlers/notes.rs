use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{common::error::AppError, config::AppState, middleware::auth::AuthenticatedUser};

pub async fn list_notes(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(bloc_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let notes = app_state.services.notes.list(bloc_id, actor).await?;
    Ok((StatusCode::OK, Json(notes)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateNotePayload {
    pub bloc: Uuid,
    #[validate(length(min = 1, message = "content is required"))]
    pub content: String,
}

pub async fn create_note(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<CreateNotePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let note = app_state
        .services
        .notes
        .create(payload.bloc, payload.content, actor)
        .await?;
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn delete_note(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(note_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.services.notes.delete(note_id, actor).await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Note deleted with success" })),
    ))
}
