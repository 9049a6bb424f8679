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

pub async fn list_tags(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(warehouse_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let tags = app_state.services.tags.list(warehouse_id, actor).await?;
    Ok((StatusCode::OK, Json(tags)))
}

fn default_color() -> String {
    "#808080".to_string()
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTagPayload {
    pub warehouse: Uuid,
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(default = "default_color")]
    pub color: String,
}

pub async fn create_tag(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<CreateTagPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let tag = app_state
        .services
        .tags
        .create(payload.warehouse, payload.name, payload.color, actor)
        .await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTagPayload {
    #[validate(length(min = 1, message = "name cannot be empty"))]
    pub name: Option<String>,
    pub color: Option<String>,
}

pub async fn update_tag(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(tag_id): Path<Uuid>,
    Json(payload): Json<UpdateTagPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let tag = app_state
        .services
        .tags
        .update(tag_id, payload.name, payload.color, actor)
        .await?;
    Ok((StatusCode::OK, Json(tag)))
}

pub async fn delete_tag(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(tag_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.services.tags.delete(tag_id, actor).await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Tag deleted with success" })),
    ))
}
