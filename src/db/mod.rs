// Store traits over the entity store. The engine only ever talks to these,
// so the same services run against Postgres in production and against the
// in-memory store in the test-suite.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::{Bloc, Note, Tag, Warehouse};

pub mod memory;
pub mod postgres;

#[async_trait]
pub trait WarehouseStore: Send + Sync {
    async fn insert(&self, warehouse: &Warehouse) -> Result<(), AppError>;
    async fn find(&self, id: Uuid) -> Result<Option<Warehouse>, AppError>;
    /// Warehouses the user owns or is a member of.
    async fn find_for_user(&self, user: Uuid) -> Result<Vec<Warehouse>, AppError>;
    async fn find_by_invite(&self, token: &str) -> Result<Option<Warehouse>, AppError>;
    async fn update(&self, warehouse: &Warehouse) -> Result<(), AppError>;
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait BlocStore: Send + Sync {
    async fn insert(&self, bloc: &Bloc) -> Result<(), AppError>;
    async fn find(&self, id: Uuid) -> Result<Option<Bloc>, AppError>;
    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Bloc>, AppError>;
    /// Direct children, i.e. blocs whose container is `Child(parent)`.
    async fn children_of(&self, parent: Uuid) -> Result<Vec<Bloc>, AppError>;
    /// Root blocs of a warehouse, i.e. blocs whose container is `Root`.
    async fn roots_of(&self, warehouse: Uuid) -> Result<Vec<Bloc>, AppError>;
    async fn in_warehouse(&self, warehouse: Uuid) -> Result<Vec<Bloc>, AppError>;
    async fn update(&self, bloc: &Bloc) -> Result<(), AppError>;
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait TagStore: Send + Sync {
    async fn insert(&self, tag: &Tag) -> Result<(), AppError>;
    async fn find(&self, id: Uuid) -> Result<Option<Tag>, AppError>;
    async fn in_warehouse(&self, warehouse: Uuid) -> Result<Vec<Tag>, AppError>;
    async fn update(&self, tag: &Tag) -> Result<(), AppError>;
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
}

#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn insert(&self, note: &Note) -> Result<(), AppError>;
    async fn find(&self, id: Uuid) -> Result<Option<Note>, AppError>;
    async fn for_bloc(&self, bloc: Uuid) -> Result<Vec<Note>, AppError>;
    async fn delete(&self, id: Uuid) -> Result<(), AppError>;
    async fn delete_for_bloc(&self, bloc: Uuid) -> Result<(), AppError>;
}

/// Handle bundle passed to every service.
#[derive(Clone)]
pub struct Stores {
    pub warehouses: Arc<dyn WarehouseStore>,
    pub blocs: Arc<dyn BlocStore>,
    pub tags: Arc<dyn TagStore>,
    pub notes: Arc<dyn NoteStore>,
}

impl Stores {
    pub fn postgres(pool: PgPool) -> Self {
        let store = Arc::new(postgres::PgStore::new(pool));
        Self {
            warehouses: store.clone(),
            blocs: store.clone(),
            tags: store.clone(),
            notes: store,
        }
    }

    pub fn in_memory() -> Self {
        let store = Arc::new(memory::MemoryStore::default());
        Self {
            warehouses: store.clone(),
            blocs: store.clone(),
            tags: store.clone(),
            notes: store,
        }
    }
}
