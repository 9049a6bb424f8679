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

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{Location, Role},
    services::warehouse_service::{NewWarehouse, WarehousePatch},
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateWarehousePayload {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub location: Location,
    #[validate(range(min = 0.0, message = "width cannot be negative"))]
    pub width: Option<f64>,
    #[validate(range(min = 0.0, message = "height cannot be negative"))]
    pub height: Option<f64>,
    #[validate(range(min = 0.0, message = "depth cannot be negative"))]
    pub depth: Option<f64>,
    #[validate(range(min = 0.0, message = "maxWeight cannot be negative"))]
    pub max_weight: Option<f64>,
}

pub async fn create_warehouse(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<CreateWarehousePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let warehouse = app_state
        .services
        .warehouses
        .create(
            NewWarehouse {
                name: payload.name,
                description: payload.description,
                location: payload.location,
                width: payload.width,
                height: payload.height,
                depth: payload.depth,
                max_weight: payload.max_weight,
            },
            actor,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(warehouse)))
}

pub async fn list_warehouses(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
) -> Result<impl IntoResponse, AppError> {
    let warehouses = app_state.services.warehouses.list_for_user(actor).await?;
    Ok((StatusCode::OK, Json(warehouses)))
}

pub async fn get_warehouse(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(warehouse_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let warehouse = app_state
        .services
        .warehouses
        .get(warehouse_id, actor)
        .await?;
    Ok((StatusCode::OK, Json(warehouse)))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWarehousePayload {
    #[validate(length(min = 1, message = "name cannot be empty"))]
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<Location>,
    #[validate(range(min = 0.0, message = "width cannot be negative"))]
    pub width: Option<f64>,
    #[validate(range(min = 0.0, message = "height cannot be negative"))]
    pub height: Option<f64>,
    #[validate(range(min = 0.0, message = "depth cannot be negative"))]
    pub depth: Option<f64>,
    #[validate(range(min = 0.0, message = "maxWeight cannot be negative"))]
    pub max_weight: Option<f64>,
    pub plan_image: Option<String>,
}

pub async fn update_warehouse(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(warehouse_id): Path<Uuid>,
    Json(payload): Json<UpdateWarehousePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let warehouse = app_state
        .services
        .warehouses
        .update(
            warehouse_id,
            WarehousePatch {
                name: payload.name,
                description: payload.description,
                location: payload.location,
                width: payload.width,
                height: payload.height,
                depth: payload.depth,
                max_weight: payload.max_weight,
                plan_image: payload.plan_image,
            },
            actor,
        )
        .await?;
    Ok((StatusCode::OK, Json(warehouse)))
}

pub async fn delete_warehouse(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(warehouse_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state
        .services
        .warehouses
        .delete(warehouse_id, actor)
        .await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Warehouse deleted with success" })),
    ))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitePayload {
    #[serde(default = "default_invite_role")]
    pub role: Role,
    pub ttl_hours: Option<i64>,
}

fn default_invite_role() -> Role {
    Role::Member
}

pub async fn issue_invite(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(warehouse_id): Path<Uuid>,
    Json(payload): Json<InvitePayload>,
) -> Result<impl IntoResponse, AppError> {
    let warehouse = app_state
        .services
        .warehouses
        .issue_invite(warehouse_id, payload.role, payload.ttl_hours, actor)
        .await?;
    Ok((
        StatusCode::OK,
        Json(json!({
            "inviteToken": warehouse.invite_token,
            "inviteRole": warehouse.invite_role,
            "inviteExpires": warehouse.invite_expires,
        })),
    ))
}

#[derive(Debug, Deserialize)]
pub struct JoinPayload {
    pub token: String,
}

pub async fn join_warehouse(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<JoinPayload>,
) -> Result<impl IntoResponse, AppError> {
    let warehouse = app_state
        .services
        .warehouses
        .join(&payload.token, actor)
        .await?;
    Ok((StatusCode::OK, Json(warehouse)))
}
