// In-memory entity store. Backs the test-suite and storage-less deployments;
// behaviour mirrors the Postgres store, including the read-then-write-back
// model the services rely on.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::{Bloc, Note, Tag, Warehouse};

use super::{BlocStore, NoteStore, TagStore, WarehouseStore};

#[derive(Default)]
pub struct MemoryStore {
    warehouses: RwLock<HashMap<Uuid, Warehouse>>,
    blocs: RwLock<HashMap<Uuid, Bloc>>,
    tags: RwLock<HashMap<Uuid, Tag>>,
    notes: RwLock<HashMap<Uuid, Note>>,
}

/// Stable ordering so listings do not shuffle between calls.
fn sorted_blocs(mut blocs: Vec<Bloc>) -> Vec<Bloc> {
    blocs.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
    blocs
}

#[async_trait]
impl WarehouseStore for MemoryStore {
    async fn insert(&self, warehouse: &Warehouse) -> Result<(), AppError> {
        self.warehouses
            .write()
            .expect("lock poisoned")
            .insert(warehouse.id, warehouse.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Warehouse>, AppError> {
        Ok(self
            .warehouses
            .read()
            .expect("lock poisoned")
            .get(&id)
            .cloned())
    }

    async fn find_for_user(&self, user: Uuid) -> Result<Vec<Warehouse>, AppError> {
        let mut out: Vec<Warehouse> = self
            .warehouses
            .read()
            .expect("lock poisoned")
            .values()
            .filter(|w| w.owner == user || w.members.iter().any(|m| m.user == user))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn find_by_invite(&self, token: &str) -> Result<Option<Warehouse>, AppError> {
        Ok(self
            .warehouses
            .read()
            .expect("lock poisoned")
            .values()
            .find(|w| w.invite_token.as_deref() == Some(token))
            .cloned())
    }

    async fn update(&self, warehouse: &Warehouse) -> Result<(), AppError> {
        self.warehouses
            .write()
            .expect("lock poisoned")
            .insert(warehouse.id, warehouse.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.warehouses.write().expect("lock poisoned").remove(&id);
        Ok(())
    }
}

#[async_trait]
impl BlocStore for MemoryStore {
    async fn insert(&self, bloc: &Bloc) -> Result<(), AppError> {
        self.blocs
            .write()
            .expect("lock poisoned")
            .insert(bloc.id, bloc.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Bloc>, AppError> {
        Ok(self.blocs.read().expect("lock poisoned").get(&id).cloned())
    }

    async fn find_many(&self, ids: &[Uuid]) -> Result<Vec<Bloc>, AppError> {
        let map = self.blocs.read().expect("lock poisoned");
        Ok(ids.iter().filter_map(|id| map.get(id).cloned()).collect())
    }

    async fn children_of(&self, parent: Uuid) -> Result<Vec<Bloc>, AppError> {
        let out = self
            .blocs
            .read()
            .expect("lock poisoned")
            .values()
            .filter(|b| b.parent() == Some(parent))
            .cloned()
            .collect();
        Ok(sorted_blocs(out))
    }

    async fn roots_of(&self, warehouse: Uuid) -> Result<Vec<Bloc>, AppError> {
        let out = self
            .blocs
            .read()
            .expect("lock poisoned")
            .values()
            .filter(|b| b.warehouse == warehouse && b.container.is_root())
            .cloned()
            .collect();
        Ok(sorted_blocs(out))
    }

    async fn in_warehouse(&self, warehouse: Uuid) -> Result<Vec<Bloc>, AppError> {
        let out = self
            .blocs
            .read()
            .expect("lock poisoned")
            .values()
            .filter(|b| b.warehouse == warehouse)
            .cloned()
            .collect();
        Ok(sorted_blocs(out))
    }

    async fn update(&self, bloc: &Bloc) -> Result<(), AppError> {
        self.blocs
            .write()
            .expect("lock poisoned")
            .insert(bloc.id, bloc.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.blocs.write().expect("lock poisoned").remove(&id);
        Ok(())
    }
}

#[async_trait]
impl TagStore for MemoryStore {
    async fn insert(&self, tag: &Tag) -> Result<(), AppError> {
        self.tags
            .write()
            .expect("lock poisoned")
            .insert(tag.id, tag.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Tag>, AppError> {
        Ok(self.tags.read().expect("lock poisoned").get(&id).cloned())
    }

    async fn in_warehouse(&self, warehouse: Uuid) -> Result<Vec<Tag>, AppError> {
        let mut out: Vec<Tag> = self
            .tags
            .read()
            .expect("lock poisoned")
            .values()
            .filter(|t| t.warehouse == warehouse)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn update(&self, tag: &Tag) -> Result<(), AppError> {
        self.tags
            .write()
            .expect("lock poisoned")
            .insert(tag.id, tag.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.tags.write().expect("lock poisoned").remove(&id);
        Ok(())
    }
}

#[async_trait]
impl NoteStore for MemoryStore {
    async fn insert(&self, note: &Note) -> Result<(), AppError> {
        self.notes
            .write()
            .expect("lock poisoned")
            .insert(note.id, note.clone());
        Ok(())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Note>, AppError> {
        Ok(self.notes.read().expect("lock poisoned").get(&id).cloned())
    }

    async fn for_bloc(&self, bloc: Uuid) -> Result<Vec<Note>, AppError> {
        let mut out: Vec<Note> = self
            .notes
            .read()
            .expect("lock poisoned")
            .values()
            .filter(|n| n.bloc == bloc)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(out)
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.notes.write().expect("lock poisoned").remove(&id);
        Ok(())
    }

    async fn delete_for_bloc(&self, bloc: Uuid) -> Result<(), AppError> {
        self.notes
            .write()
            .expect("lock poisoned")
            .retain(|_, n| n.bloc != bloc);
        Ok(())
    }
}
