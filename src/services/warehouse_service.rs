// Warehouse lifecycle and membership. Deleting a warehouse cascades through
// every bloc it contains, their notes, and its tags.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::Stores;
use crate::models::warehouse::{ADMIN_ROLES, READ_ROLES};
use crate::models::{Location, Member, Role, UserRef, Warehouse};

#[derive(Debug, Clone, Default)]
pub struct NewWarehouse {
    pub name: String,
    pub description: Option<String>,
    pub location: Location,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub depth: Option<f64>,
    pub max_weight: Option<f64>,
}

/// `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct WarehousePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub location: Option<Location>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub depth: Option<f64>,
    pub max_weight: Option<f64>,
    pub plan_image: Option<String>,
}

#[derive(Clone)]
pub struct WarehouseService {
    stores: Stores,
}

impl WarehouseService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    async fn guarded(
        &self,
        id: Uuid,
        actor: UserRef,
        required: &[Role],
    ) -> Result<Warehouse, AppError> {
        let warehouse = self
            .stores
            .warehouses
            .find(id)
            .await?
            .ok_or(AppError::WarehouseNotFound)?;
        if !warehouse.permits(actor, required) {
            return Err(AppError::PermissionDenied);
        }
        Ok(warehouse)
    }

    pub async fn create(
        &self,
        input: NewWarehouse,
        actor: UserRef,
    ) -> Result<Warehouse, AppError> {
        let now = Utc::now();
        let warehouse = Warehouse {
            id: Uuid::new_v4(),
            name: input.name,
            description: input.description,
            location: input.location,
            width: input.width,
            height: input.height,
            depth: input.depth,
            max_weight: input.max_weight,
            owner: actor.id,
            members: Vec::new(),
            plan_image: None,
            invite_token: None,
            invite_role: None,
            invite_expires: None,
            created_at: now,
            last_update: now,
        };
        self.stores.warehouses.insert(&warehouse).await?;
        tracing::info!(warehouse = %warehouse.id, "warehouse created");
        Ok(warehouse)
    }

    pub async fn list_for_user(&self, actor: UserRef) -> Result<Vec<Warehouse>, AppError> {
        self.stores.warehouses.find_for_user(actor.id).await
    }

    pub async fn get(&self, id: Uuid, actor: UserRef) -> Result<Warehouse, AppError> {
        self.guarded(id, actor, READ_ROLES).await
    }

    pub async fn update(
        &self,
        id: Uuid,
        patch: WarehousePatch,
        actor: UserRef,
    ) -> Result<Warehouse, AppError> {
        let mut warehouse = self.guarded(id, actor, ADMIN_ROLES).await?;
        if let Some(name) = patch.name {
            warehouse.name = name;
        }
        if let Some(description) = patch.description {
            warehouse.description = Some(description);
        }
        if let Some(location) = patch.location {
            warehouse.location = location;
        }
        if let Some(width) = patch.width {
            warehouse.width = Some(width);
        }
        if let Some(height) = patch.height {
            warehouse.height = Some(height);
        }
        if let Some(depth) = patch.depth {
            warehouse.depth = Some(depth);
        }
        if let Some(max_weight) = patch.max_weight {
            warehouse.max_weight = Some(max_weight);
        }
        if let Some(plan_image) = patch.plan_image {
            warehouse.plan_image = Some(plan_image);
        }
        warehouse.last_update = Utc::now();
        self.stores.warehouses.update(&warehouse).await?;
        Ok(warehouse)
    }

    /// Deletes the warehouse and everything in it: blocs deepest-first so
    /// children always go before their parent, each bloc's notes, then the
    /// warehouse's tags.
    pub async fn delete(&self, id: Uuid, actor: UserRef) -> Result<(), AppError> {
        self.guarded(id, actor, ADMIN_ROLES).await?;

        let blocs = self.stores.blocs.in_warehouse(id).await?;
        let parent_of: HashMap<Uuid, Option<Uuid>> =
            blocs.iter().map(|b| (b.id, b.parent())).collect();
        let mut ordered: Vec<(usize, Uuid)> = blocs
            .iter()
            .map(|b| {
                let mut depth = 0;
                let mut cursor = b.parent();
                while let Some(p) = cursor {
                    depth += 1;
                    cursor = parent_of.get(&p).copied().flatten();
                }
                (depth, b.id)
            })
            .collect();
        ordered.sort_by(|a, b| b.0.cmp(&a.0));

        for (_, bloc_id) in ordered {
            self.stores.notes.delete_for_bloc(bloc_id).await?;
            self.stores.blocs.delete(bloc_id).await?;
        }
        for tag in self.stores.tags.in_warehouse(id).await? {
            self.stores.tags.delete(tag.id).await?;
        }
        self.stores.warehouses.delete(id).await?;
        tracing::info!(warehouse = %id, "warehouse deleted");
        Ok(())
    }

    /// Issues a fresh invite token carrying the role future joiners get.
    pub async fn issue_invite(
        &self,
        id: Uuid,
        role: Role,
        ttl_hours: Option<i64>,
        actor: UserRef,
    ) -> Result<Warehouse, AppError> {
        let mut warehouse = self.guarded(id, actor, ADMIN_ROLES).await?;
        warehouse.invite_token = Some(Uuid::new_v4().simple().to_string());
        warehouse.invite_role = Some(role);
        warehouse.invite_expires = Some(Utc::now() + Duration::hours(ttl_hours.unwrap_or(168)));
        warehouse.last_update = Utc::now();
        self.stores.warehouses.update(&warehouse).await?;
        Ok(warehouse)
    }

    /// Redeems an invite token, adding the caller as a member with the
    /// invite's role.
    pub async fn join(&self, token: &str, actor: UserRef) -> Result<Warehouse, AppError> {
        let mut warehouse = self
            .stores
            .warehouses
            .find_by_invite(token)
            .await?
            .ok_or(AppError::InvalidInvite)?;
        if let Some(expires) = warehouse.invite_expires {
            if expires < Utc::now() {
                return Err(AppError::InvalidInvite);
            }
        }
        if warehouse.role_of(actor.id).is_some() {
            return Err(AppError::AlreadyMember);
        }
        warehouse.members.push(Member {
            user: actor.id,
            role: warehouse.invite_role.unwrap_or(Role::Member),
        });
        warehouse.last_update = Utc::now();
        self.stores.warehouses.update(&warehouse).await?;
        tracing::info!(warehouse = %warehouse.id, user = %actor.id, "member joined via invite");
        Ok(warehouse)
    }
}
