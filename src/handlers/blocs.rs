use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::auth::AuthenticatedUser,
    models::{Container, CustomField, Position},
    services::bloc_service::{BlocPatch, NewBloc},
    services::batch_service::DimensionsPatch,
    services::search::SortKey,
};

// The original clients send a parent as an id, as JSON null, or as the
// literal string "null"; all of the last two mean "warehouse root".
fn de_parent<'de, D>(deserializer: D) -> Result<Option<Uuid>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s == "null" || s.is_empty() => Ok(None),
        Some(Value::String(s)) => Uuid::parse_str(&s)
            .map(Some)
            .map_err(serde::de::Error::custom),
        Some(other) => Err(serde::de::Error::custom(format!(
            "invalid parent value: {other}"
        ))),
    }
}

// In a partial update, an absent parent keeps the container; a present
// null (or "null") moves the bloc to the warehouse root.
fn de_parent_patch<'de, D>(deserializer: D) -> Result<Option<Container>, D::Error>
where
    D: Deserializer<'de>,
{
    de_parent(deserializer).map(|p| Some(Container::from_parent(p)))
}

fn default_count() -> u32 {
    1
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlocPayload {
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(default, deserialize_with = "de_parent")]
    pub parent: Option<Uuid>,
    pub warehouse: Uuid,
    #[validate(range(min = 0.0, message = "width cannot be negative"))]
    pub width: Option<f64>,
    #[validate(range(min = 0.0, message = "height cannot be negative"))]
    pub height: Option<f64>,
    #[validate(range(min = 0.0, message = "depth cannot be negative"))]
    pub depth: Option<f64>,
    #[validate(range(min = 0.0, message = "weight cannot be negative"))]
    pub weight: Option<f64>,
    #[validate(range(min = 0.0, message = "maxWeight cannot be negative"))]
    pub max_weight: Option<f64>,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub tags: Vec<Uuid>,
    #[serde(default)]
    pub custom_fields: Vec<CustomField>,
    pub picture: Option<String>,
    /// Number of identical siblings to create in one call.
    #[serde(default = "default_count")]
    #[validate(range(min = 1, max = 100, message = "count must be between 1 and 100"))]
    pub count: u32,
    #[serde(default = "default_true")]
    pub same_name_for_all: bool,
}

pub async fn create_bloc(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<CreateBlocPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let result = app_state
        .services
        .blocs
        .create_blocs(
            NewBloc {
                name: payload.name,
                parent: payload.parent,
                warehouse: payload.warehouse,
                width: payload.width,
                height: payload.height,
                depth: payload.depth,
                weight: payload.weight,
                max_weight: payload.max_weight,
                position: payload.position,
                tags: payload.tags,
                custom_fields: payload.custom_fields,
                picture: payload.picture,
                count: payload.count,
                same_name_for_all: payload.same_name_for_all,
            },
            actor,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(result)))
}

pub async fn delete_bloc(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(bloc_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    app_state.services.blocs.delete_bloc(bloc_id, actor).await?;
    Ok((
        StatusCode::OK,
        Json(json!({ "message": "Bloc deleted with success" })),
    ))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlocPayload {
    #[validate(length(min = 1, message = "name cannot be empty"))]
    pub name: Option<String>,
    #[validate(range(min = 0.0, message = "width cannot be negative"))]
    pub width: Option<f64>,
    #[validate(range(min = 0.0, message = "height cannot be negative"))]
    pub height: Option<f64>,
    #[validate(range(min = 0.0, message = "depth cannot be negative"))]
    pub depth: Option<f64>,
    #[validate(range(min = 0.0, message = "weight cannot be negative"))]
    pub weight: Option<f64>,
    #[validate(range(min = 0.0, message = "maxWeight cannot be negative"))]
    pub max_weight: Option<f64>,
    pub position: Option<Position>,
    pub picture: Option<String>,
    pub custom_fields: Option<Vec<CustomField>>,
    pub tags: Option<Vec<Uuid>>,
    #[serde(default, deserialize_with = "de_parent_patch")]
    pub parent: Option<Container>,
    pub warehouse: Option<Uuid>,
}

pub async fn update_bloc(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(bloc_id): Path<Uuid>,
    Json(payload): Json<UpdateBlocPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let bloc = app_state
        .services
        .blocs
        .update_bloc(
            bloc_id,
            BlocPatch {
                name: payload.name,
                width: payload.width,
                height: payload.height,
                depth: payload.depth,
                weight: payload.weight,
                max_weight: payload.max_weight,
                position: payload.position,
                picture: payload.picture,
                custom_fields: payload.custom_fields,
                tags: payload.tags,
                parent: payload.parent,
                warehouse: payload.warehouse,
            },
            actor,
        )
        .await?;

    Ok((StatusCode::OK, Json(bloc)))
}

pub async fn get_bloc(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(bloc_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let detail = app_state.services.blocs.get_bloc(bloc_id, actor).await?;
    Ok((StatusCode::OK, Json(detail)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupPayload {
    pub bloc_ids: Vec<Uuid>,
}

pub async fn lookup_blocs(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<LookupPayload>,
) -> Result<impl IntoResponse, AppError> {
    let blocs = app_state
        .services
        .blocs
        .get_many(&payload.bloc_ids, actor)
        .await?;
    Ok((StatusCode::OK, Json(blocs)))
}

#[derive(Debug, Deserialize)]
pub struct MovePayload {
    pub position: Position,
}

pub async fn move_bloc(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(bloc_id): Path<Uuid>,
    Json(payload): Json<MovePayload>,
) -> Result<impl IntoResponse, AppError> {
    let bloc = app_state
        .services
        .blocs
        .move_bloc(bloc_id, payload.position, actor)
        .await?;
    Ok((StatusCode::OK, Json(bloc)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveManyPayload {
    pub blocs: Vec<BlocMove>,
}

#[derive(Debug, Deserialize)]
pub struct BlocMove {
    pub id: Uuid,
    pub position: Position,
}

pub async fn move_blocs(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<MoveManyPayload>,
) -> Result<impl IntoResponse, AppError> {
    let moves: Vec<(Uuid, Position)> = payload
        .blocs
        .into_iter()
        .map(|m| (m.id, m.position))
        .collect();
    let results = app_state.services.blocs.move_blocs(&moves, actor).await?;
    Ok((StatusCode::OK, Json(results)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeParentPayload {
    #[serde(default, deserialize_with = "de_parent")]
    pub parent: Option<Uuid>,
}

pub async fn change_parent(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(bloc_id): Path<Uuid>,
    Json(payload): Json<ChangeParentPayload>,
) -> Result<impl IntoResponse, AppError> {
    let bloc = app_state
        .services
        .blocs
        .change_parent(bloc_id, payload.parent, actor)
        .await?;
    Ok((StatusCode::OK, Json(bloc)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeParentsBatchPayload {
    pub bloc_ids: Vec<Uuid>,
    #[serde(default, deserialize_with = "de_parent")]
    pub parent: Option<Uuid>,
}

pub async fn change_parents_batch(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<ChangeParentsBatchPayload>,
) -> Result<impl IntoResponse, AppError> {
    let results = app_state
        .services
        .blocs
        .change_parents_batch(&payload.bloc_ids, payload.parent, actor)
        .await?;
    Ok((StatusCode::OK, Json(results)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeWarehousePayload {
    pub warehouse: Uuid,
}

pub async fn change_warehouse(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(bloc_id): Path<Uuid>,
    Json(payload): Json<ChangeWarehousePayload>,
) -> Result<impl IntoResponse, AppError> {
    let bloc = app_state
        .services
        .blocs
        .change_warehouse(bloc_id, payload.warehouse, actor)
        .await?;
    Ok((StatusCode::OK, Json(bloc)))
}

// ---
// Batch mutations. All of these answer 200 with a per-id outcome list.
// ---

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BatchNamePayload {
    pub bloc_ids: Vec<Uuid>,
    #[validate(length(min = 1, message = "name is required"))]
    pub name: String,
    #[serde(default)]
    pub same_name_for_all: bool,
}

pub async fn batch_name(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<BatchNamePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let results = app_state
        .services
        .batch
        .rename(
            &payload.bloc_ids,
            &payload.name,
            payload.same_name_for_all,
            actor,
        )
        .await?;
    Ok((StatusCode::OK, Json(results)))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BatchDimensionsPayload {
    pub bloc_ids: Vec<Uuid>,
    #[validate(range(min = 0.0, message = "width cannot be negative"))]
    pub width: Option<f64>,
    #[validate(range(min = 0.0, message = "height cannot be negative"))]
    pub height: Option<f64>,
    #[validate(range(min = 0.0, message = "depth cannot be negative"))]
    pub depth: Option<f64>,
    #[validate(range(min = 0.0, message = "weight cannot be negative"))]
    pub weight: Option<f64>,
}

pub async fn batch_dimensions(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<BatchDimensionsPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let results = app_state
        .services
        .batch
        .resize(
            &payload.bloc_ids,
            DimensionsPatch {
                width: payload.width,
                height: payload.height,
                depth: payload.depth,
                weight: payload.weight,
            },
            actor,
        )
        .await?;
    Ok((StatusCode::OK, Json(results)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchTagsPayload {
    pub bloc_ids: Vec<Uuid>,
    pub tags: Vec<Uuid>,
    #[serde(default)]
    pub remove_other_tags: bool,
}

pub async fn batch_tags(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<BatchTagsPayload>,
) -> Result<impl IntoResponse, AppError> {
    let results = app_state
        .services
        .batch
        .retag(
            &payload.bloc_ids,
            payload.tags,
            payload.remove_other_tags,
            actor,
        )
        .await?;
    Ok((StatusCode::OK, Json(results)))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct BatchPicturePayload {
    pub bloc_ids: Vec<Uuid>,
    #[validate(length(min = 1, message = "picture is required"))]
    pub picture: String,
}

pub async fn batch_picture(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Json(payload): Json<BatchPicturePayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let results = app_state
        .services
        .batch
        .set_picture(&payload.bloc_ids, &payload.picture, actor)
        .await?;
    Ok((StatusCode::OK, Json(results)))
}

// ---
// Listing and search
// ---

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
    /// Comma-separated tag ids; malformed entries are dropped.
    pub tags: Option<String>,
    /// `field:direction` pairs, e.g. `name:asc,weight:desc`.
    pub sort: Option<String>,
}

pub async fn search_blocs(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(warehouse_id): Path<Uuid>,
    Query(params): Query<SearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let tag_filter: Vec<Uuid> = params
        .tags
        .as_deref()
        .unwrap_or("")
        .split(',')
        .filter_map(|s| Uuid::parse_str(s.trim()).ok())
        .collect();
    let sort = params
        .sort
        .as_deref()
        .map(SortKey::parse_list)
        .unwrap_or_default();

    let hits = app_state
        .services
        .search
        .search_blocs(
            warehouse_id,
            params.q.as_deref(),
            &tag_filter,
            &sort,
            actor,
        )
        .await?;
    Ok((StatusCode::OK, Json(hits)))
}

pub async fn warehouse_roots(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(warehouse_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let roots = app_state.services.blocs.roots(warehouse_id, actor).await?;
    Ok((StatusCode::OK, Json(roots)))
}

// ---
// Picture upload: multipart field "picture" stored through the blob store.
// ---

pub async fn upload_picture(
    State(app_state): State<AppState>,
    AuthenticatedUser(actor): AuthenticatedUser,
    Path(bloc_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Internal(e.into()))?
    {
        if field.name() != Some("picture") {
            continue;
        }
        let extension = field
            .file_name()
            .and_then(|name| name.rsplit('.').next().map(str::to_string))
            .unwrap_or_else(|| "bin".to_string());
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Internal(e.into()))?;
        let url = app_state.blob_store.store(&bytes, &extension).await?;
        let bloc = app_state
            .services
            .blocs
            .update_bloc(
                bloc_id,
                BlocPatch {
                    picture: Some(url),
                    ..Default::default()
                },
                actor,
            )
            .await?;
        return Ok((StatusCode::OK, Json(bloc)));
    }

    let mut errors = validator::ValidationErrors::new();
    errors.add(
        "picture".into(),
        validator::ValidationError::new("required"),
    );
    Err(AppError::Validation(errors))
}
