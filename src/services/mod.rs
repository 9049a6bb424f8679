pub mod batch_service;
pub mod bloc_service;
pub mod capacity;
pub mod note_service;
pub mod search;
pub mod tag_service;
pub mod warehouse_service;

use serde::Serialize;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::Stores;

pub use batch_service::BatchService;
pub use bloc_service::BlocService;
pub use note_service::NoteService;
pub use search::SearchService;
pub use tag_service::TagService;
pub use warehouse_service::WarehouseService;

/// Serializable form of an error attached to a single item of a batch.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemError {
    pub kind: &'static str,
    pub message: String,
}

impl From<&AppError> for ItemError {
    fn from(err: &AppError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Per-item outcome of a batch operation. Batch endpoints answer 200 even
/// when individual items fail; partial failure is data, not a status code.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "camelCase")]
pub enum Outcome {
    Updated,
    /// The id did not resolve to a bloc; processing moved on.
    Skipped,
    Failed(ItemError),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchItem {
    pub id: Uuid,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl BatchItem {
    pub fn updated(id: Uuid) -> Self {
        Self {
            id,
            outcome: Outcome::Updated,
        }
    }

    pub fn skipped(id: Uuid) -> Self {
        Self {
            id,
            outcome: Outcome::Skipped,
        }
    }

    pub fn failed(id: Uuid, err: &AppError) -> Self {
        Self {
            id,
            outcome: Outcome::Failed(ItemError::from(err)),
        }
    }

    pub fn is_updated(&self) -> bool {
        matches!(self.outcome, Outcome::Updated)
    }
}

/// The full service graph over one store bundle.
#[derive(Clone)]
pub struct Services {
    pub warehouses: WarehouseService,
    pub blocs: BlocService,
    pub batch: BatchService,
    pub tags: TagService,
    pub notes: NoteService,
    pub search: SearchService,
}

impl Services {
    pub fn new(stores: Stores) -> Self {
        let blocs = BlocService::new(stores.clone());
        Self {
            warehouses: WarehouseService::new(stores.clone()),
            batch: BatchService::new(blocs.clone()),
            tags: TagService::new(stores.clone()),
            notes: NoteService::new(stores.clone()),
            search: SearchService::new(stores),
            blocs,
        }
    }
}
