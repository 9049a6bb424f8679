// Notes hang off a bloc and disappear with it; the containment engine owns
// the cascade, this service only covers direct CRUD.

use chrono::Utc;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::Stores;
use crate::models::warehouse::{Role, READ_ROLES, WRITE_ROLES};
use crate::models::{Note, UserRef};

#[derive(Clone)]
pub struct NoteService {
    stores: Stores,
}

impl NoteService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    async fn guard_bloc(
        &self,
        bloc: Uuid,
        actor: UserRef,
        required: &[Role],
    ) -> Result<Uuid, AppError> {
        let bloc = self
            .stores
            .blocs
            .find(bloc)
            .await?
            .ok_or(AppError::BlocNotFound)?;
        let warehouse = self
            .stores
            .warehouses
            .find(bloc.warehouse)
            .await?
            .ok_or(AppError::WarehouseNotFound)?;
        if !warehouse.permits(actor, required) {
            return Err(AppError::PermissionDenied);
        }
        Ok(bloc.id)
    }

    pub async fn list(&self, bloc: Uuid, actor: UserRef) -> Result<Vec<Note>, AppError> {
        let bloc = self.guard_bloc(bloc, actor, READ_ROLES).await?;
        self.stores.notes.for_bloc(bloc).await
    }

    pub async fn create(
        &self,
        bloc: Uuid,
        content: String,
        actor: UserRef,
    ) -> Result<Note, AppError> {
        let bloc = self.guard_bloc(bloc, actor, WRITE_ROLES).await?;
        let note = Note {
            id: Uuid::new_v4(),
            content,
            bloc,
            user: actor.id,
            created_at: Utc::now(),
        };
        self.stores.notes.insert(&note).await?;
        Ok(note)
    }

    pub async fn delete(&self, id: Uuid, actor: UserRef) -> Result<(), AppError> {
        let note = self
            .stores
            .notes
            .find(id)
            .await?
            .ok_or(AppError::NoteNotFound)?;
        self.guard_bloc(note.bloc, actor, WRITE_ROLES).await?;
        self.stores.notes.delete(id).await
    }
}
