use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

// Application error type. Every failure a handler can surface lives here,
// so services return `Result<_, AppError>` all the way up.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed")]
    Validation(#[from] validator::ValidationErrors),

    #[error("warehouse not found")]
    WarehouseNotFound,

    #[error("bloc not found")]
    BlocNotFound,

    #[error("parent bloc not found")]
    ParentNotFound,

    #[error("tag not found")]
    TagNotFound,

    #[error("note not found")]
    NoteNotFound,

    #[error("adding {delta} to the current {current} would exceed the {limit} ceiling")]
    CapacityExceeded { current: f64, limit: f64, delta: f64 },

    #[error("a bloc cannot be moved inside its own subtree")]
    CycleDetected,

    #[error("the target parent belongs to another warehouse")]
    WrongWarehouse,

    #[error("invalid or expired invite token")]
    InvalidInvite,

    #[error("user is already a member of this warehouse")]
    AlreadyMember,

    #[error("permission denied")]
    PermissionDenied,

    #[error("invalid or missing authentication token")]
    InvalidToken,

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

impl AppError {
    /// Short machine-readable code, used in response bodies and in per-item
    /// batch outcomes.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION",
            AppError::WarehouseNotFound => "WAREHOUSE_NOT_FOUND",
            AppError::BlocNotFound => "BLOC_NOT_FOUND",
            AppError::ParentNotFound => "PARENT_NOT_FOUND",
            AppError::TagNotFound => "TAG_NOT_FOUND",
            AppError::NoteNotFound => "NOTE_NOT_FOUND",
            AppError::CapacityExceeded { .. } => "CAPACITY_EXCEEDED",
            AppError::CycleDetected => "CYCLE_DETECTED",
            AppError::WrongWarehouse => "WRONG_WAREHOUSE",
            AppError::InvalidInvite => "INVALID_INVITE",
            AppError::AlreadyMember => "ALREADY_MEMBER",
            AppError::PermissionDenied => "PERMISSION_DENIED",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::Database(_) | AppError::Internal(_) => "INTERNAL",
            AppError::Jwt(_) => "INVALID_TOKEN",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::CycleDetected
            | AppError::WrongWarehouse
            | AppError::InvalidInvite
            | AppError::AlreadyMember => StatusCode::BAD_REQUEST,
            AppError::WarehouseNotFound
            | AppError::BlocNotFound
            | AppError::ParentNotFound
            | AppError::TagNotFound
            | AppError::NoteNotFound => StatusCode::NOT_FOUND,
            AppError::CapacityExceeded { .. } => StatusCode::CONFLICT,
            AppError::PermissionDenied => StatusCode::FORBIDDEN,
            AppError::InvalidToken | AppError::Jwt(_) => StatusCode::UNAUTHORIZED,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Validation errors carry per-field details the frontend can render.
        if let AppError::Validation(errors) = &self {
            let mut details = std::collections::HashMap::new();
            for (field, field_errors) in errors.field_errors() {
                let messages: Vec<String> = field_errors
                    .iter()
                    .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                    .collect();
                details.insert(field.to_string(), messages);
            }
            let body = Json(json!({
                "error": "One or more fields are invalid.",
                "kind": self.kind(),
                "details": details,
            }));
            return (StatusCode::BAD_REQUEST, body).into_response();
        }

        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("internal server error: {:?}", self);
        }

        let body = Json(json!({ "error": self.to_string(), "kind": self.kind() }));
        (status, body).into_response()
    }
}
