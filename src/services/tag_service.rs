// Tag CRUD. Tags live independently of blocs; removing one pulls it out of
// every bloc that references it.

use chrono::Utc;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::Stores;
use crate::models::warehouse::{READ_ROLES, WRITE_ROLES};
use crate::models::{Role, Tag, UserRef};

#[derive(Clone)]
pub struct TagService {
    stores: Stores,
}

impl TagService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    async fn guard(
        &self,
        warehouse: Uuid,
        actor: UserRef,
        required: &[Role],
    ) -> Result<(), AppError> {
        let warehouse = self
            .stores
            .warehouses
            .find(warehouse)
            .await?
            .ok_or(AppError::WarehouseNotFound)?;
        if !warehouse.permits(actor, required) {
            return Err(AppError::PermissionDenied);
        }
        Ok(())
    }

    pub async fn list(&self, warehouse: Uuid, actor: UserRef) -> Result<Vec<Tag>, AppError> {
        self.guard(warehouse, actor, READ_ROLES).await?;
        self.stores.tags.in_warehouse(warehouse).await
    }

    pub async fn create(
        &self,
        warehouse: Uuid,
        name: String,
        color: String,
        actor: UserRef,
    ) -> Result<Tag, AppError> {
        self.guard(warehouse, actor, WRITE_ROLES).await?;
        let tag = Tag {
            id: Uuid::new_v4(),
            name,
            color,
            warehouse,
            created_by: actor.id,
            created_at: Utc::now(),
        };
        self.stores.tags.insert(&tag).await?;
        Ok(tag)
    }

    pub async fn update(
        &self,
        id: Uuid,
        name: Option<String>,
        color: Option<String>,
        actor: UserRef,
    ) -> Result<Tag, AppError> {
        let mut tag = self.stores.tags.find(id).await?.ok_or(AppError::TagNotFound)?;
        self.guard(tag.warehouse, actor, WRITE_ROLES).await?;
        if let Some(name) = name {
            tag.name = name;
        }
        if let Some(color) = color {
            tag.color = color;
        }
        self.stores.tags.update(&tag).await?;
        Ok(tag)
    }

    /// Deletes the tag and strips it from every bloc of its warehouse.
    pub async fn delete(&self, id: Uuid, actor: UserRef) -> Result<(), AppError> {
        let tag = self.stores.tags.find(id).await?.ok_or(AppError::TagNotFound)?;
        self.guard(tag.warehouse, actor, WRITE_ROLES).await?;

        for mut bloc in self.stores.blocs.in_warehouse(tag.warehouse).await? {
            if bloc.tags.contains(&id) {
                bloc.tags.retain(|t| *t != id);
                bloc.touch();
                self.stores.blocs.update(&bloc).await?;
            }
        }
        self.stores.tags.delete(id).await
    }
}
