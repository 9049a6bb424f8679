#![allow(dead_code)]

use blocs_backend::db::Stores;
use blocs_backend::models::{Bloc, Position, UserRef};
use blocs_backend::services::bloc_service::NewBloc;
use blocs_backend::services::warehouse_service::NewWarehouse;
use blocs_backend::services::Services;
use uuid::Uuid;

/// Service graph over a fresh in-memory store, plus the raw store handles
/// for direct assertions.
pub fn setup() -> (Services, Stores) {
    let stores = Stores::in_memory();
    (Services::new(stores.clone()), stores)
}

pub fn actor() -> UserRef {
    UserRef::new(Uuid::new_v4())
}

pub async fn warehouse(services: &Services, actor: UserRef) -> Uuid {
    services
        .warehouses
        .create(
            NewWarehouse {
                name: "Main".into(),
                ..Default::default()
            },
            actor,
        )
        .await
        .expect("warehouse creation failed")
        .id
}

/// A minimal creation input; tests override the fields they care about.
pub fn bloc(name: &str, warehouse: Uuid) -> NewBloc {
    NewBloc {
        name: name.into(),
        parent: None,
        warehouse,
        width: None,
        height: None,
        depth: None,
        weight: None,
        max_weight: None,
        position: Position::default(),
        tags: Vec::new(),
        custom_fields: Vec::new(),
        picture: None,
        count: 1,
        same_name_for_all: true,
    }
}

/// Creates a single bloc and asserts nothing failed.
pub async fn create_one(services: &Services, input: NewBloc, actor: UserRef) -> Bloc {
    let mut result = services
        .blocs
        .create_blocs(input, actor)
        .await
        .expect("bloc creation failed");
    assert!(result.failures.is_empty(), "unexpected per-item failures");
    result.created.remove(0)
}
