// Containment engine: bloc creation, cascade delete, reparenting and
// cross-warehouse migration, with the aggregate-weight bookkeeping that ties
// a bloc to its parent.
//
// The engine maintains weights on write: a bloc's recorded weight is its own
// weight plus the recorded weights of its direct children, so a single
// capacity check against the immediate parent covers the whole subtree being
// attached. Deletes and reparents settle the old parent's aggregate instead
// of leaving it to drift.

use std::collections::{HashSet, VecDeque};

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::Stores;
use crate::models::warehouse::{Role, READ_ROLES, WRITE_ROLES};
use crate::models::{Bloc, Container, CustomField, Position, UserRef, Warehouse};

use super::capacity::can_accommodate;
use super::{BatchItem, ItemError};

#[derive(Debug, Clone)]
pub struct NewBloc {
    pub name: String,
    pub parent: Option<Uuid>,
    pub warehouse: Uuid,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub depth: Option<f64>,
    pub weight: Option<f64>,
    pub max_weight: Option<f64>,
    pub position: Position,
    pub tags: Vec<Uuid>,
    pub custom_fields: Vec<CustomField>,
    pub picture: Option<String>,
    /// Number of identical siblings to create.
    pub count: u32,
    /// With `count > 1`, share one name or suffix `_1.._n` in order.
    pub same_name_for_all: bool,
}

/// Fields of a single-bloc update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct BlocPatch {
    pub name: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub depth: Option<f64>,
    pub weight: Option<f64>,
    pub max_weight: Option<f64>,
    pub position: Option<Position>,
    pub picture: Option<String>,
    pub custom_fields: Option<Vec<CustomField>>,
    pub tags: Option<Vec<Uuid>>,
    /// A container move, same semantics as `change_parent`.
    pub parent: Option<Container>,
    /// Re-stamps this bloc only; moving a whole subtree is `change_warehouse`.
    pub warehouse: Option<Uuid>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFailure {
    /// Index of the failed item in creation order.
    pub index: usize,
    pub error: ItemError,
}

/// Creation is best-effort per item: a capacity failure aborts that item
/// only and the remaining siblings are still attempted. Inherited policy,
/// kept deliberately; see DESIGN.md.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedBlocs {
    pub created: Vec<Bloc>,
    pub failures: Vec<CreateFailure>,
}

/// A bloc with its display context resolved.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlocDetail {
    pub bloc: Bloc,
    pub children: Vec<Bloc>,
    /// Ancestor chain, immediate parent first.
    pub ancestors: Vec<Bloc>,
}

#[derive(Clone)]
pub struct BlocService {
    stores: Stores,
}

impl BlocService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    pub(crate) fn stores(&self) -> &Stores {
        &self.stores
    }

    /// Loads the warehouse and checks the actor's role on it.
    pub(crate) async fn warehouse_guard(
        &self,
        warehouse: Uuid,
        actor: UserRef,
        required: &[Role],
    ) -> Result<Warehouse, AppError> {
        let warehouse = self
            .stores
            .warehouses
            .find(warehouse)
            .await?
            .ok_or(AppError::WarehouseNotFound)?;
        if !warehouse.permits(actor, required) {
            return Err(AppError::PermissionDenied);
        }
        Ok(warehouse)
    }

    /// De-duplicates a tag list and drops ids the tag store does not know,
    /// mirroring the lenient inputs the original clients send.
    pub(crate) async fn normalize_tags(&self, tags: Vec<Uuid>) -> Result<Vec<Uuid>, AppError> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for id in tags {
            if !seen.insert(id) {
                continue;
            }
            if self.stores.tags.find(id).await?.is_some() {
                out.push(id);
            }
        }
        Ok(out)
    }

    pub async fn create_blocs(
        &self,
        input: NewBloc,
        actor: UserRef,
    ) -> Result<CreatedBlocs, AppError> {
        self.warehouse_guard(input.warehouse, actor, WRITE_ROLES)
            .await?;

        let mut parent = match input.parent {
            Some(pid) => {
                let parent = self
                    .stores
                    .blocs
                    .find(pid)
                    .await?
                    .ok_or(AppError::ParentNotFound)?;
                if parent.warehouse != input.warehouse {
                    return Err(AppError::WrongWarehouse);
                }
                Some(parent)
            }
            None => None,
        };

        let tags = self.normalize_tags(input.tags).await?;
        let count = input.count.max(1) as usize;
        let mut created = Vec::with_capacity(count);
        let mut failures = Vec::new();

        for index in 0..count {
            let name = if count > 1 && !input.same_name_for_all {
                format!("{}_{}", input.name, index + 1)
            } else {
                input.name.clone()
            };
            let now = Utc::now();
            let bloc = Bloc {
                id: Uuid::new_v4(),
                name,
                picture: input.picture.clone(),
                container: Container::from_parent(input.parent),
                width: input.width,
                height: input.height,
                depth: input.depth,
                weight: input.weight,
                max_weight: input.max_weight,
                position: input.position,
                tags: tags.clone(),
                custom_fields: input.custom_fields.clone(),
                warehouse: input.warehouse,
                added_by: actor.id,
                created_at: now,
                last_update: now,
            };

            match parent.as_mut() {
                Some(parent) => {
                    let delta = bloc.recorded_weight();
                    if !can_accommodate(parent.weight, parent.max_weight, delta) {
                        let err = AppError::CapacityExceeded {
                            current: parent.recorded_weight(),
                            limit: parent.max_weight.unwrap_or(0.0),
                            delta,
                        };
                        tracing::debug!(index, parent = %parent.id, "bloc creation rejected: {err}");
                        failures.push(CreateFailure {
                            index,
                            error: ItemError::from(&err),
                        });
                        continue;
                    }
                    self.stores.blocs.insert(&bloc).await?;
                    if delta != 0.0 {
                        parent.weight = Some(parent.recorded_weight() + delta);
                        parent.touch();
                        self.stores.blocs.update(parent).await?;
                    }
                }
                // Root blocs need no container write: the warehouse root list
                // is derived from the container field.
                None => self.stores.blocs.insert(&bloc).await?,
            }
            created.push(bloc);
        }

        Ok(CreatedBlocs { created, failures })
    }

    /// Deletes a bloc and its whole subtree, children before parents, along
    /// with every deleted bloc's notes. The immediate parent's aggregate
    /// weight is settled before the cascade.
    pub async fn delete_bloc(&self, id: Uuid, actor: UserRef) -> Result<(), AppError> {
        let bloc = self
            .stores
            .blocs
            .find(id)
            .await?
            .ok_or(AppError::BlocNotFound)?;
        self.warehouse_guard(bloc.warehouse, actor, WRITE_ROLES)
            .await?;

        if let Some(pid) = bloc.parent() {
            if let Some(mut parent) = self.stores.blocs.find(pid).await? {
                let weight = bloc.recorded_weight();
                if weight != 0.0 {
                    subtract_weight(&mut parent, weight);
                    parent.touch();
                    self.stores.blocs.update(&parent).await?;
                }
            }
        }

        // Explicit stack instead of recursion: hierarchies can be deep.
        // Pre-order collection, reversed for deletion, so grandchildren go
        // before children.
        let mut order = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            order.push(next);
            for child in self.stores.blocs.children_of(next).await? {
                stack.push(child.id);
            }
        }
        for target in order.into_iter().rev() {
            self.stores.notes.delete_for_bloc(target).await?;
            self.stores.blocs.delete(target).await?;
        }

        tracing::info!(bloc = %id, "bloc subtree deleted");
        Ok(())
    }

    /// True when `candidate` sits inside `root`'s subtree (or is `root`).
    async fn is_descendant(&self, root: Uuid, mut current: Uuid) -> Result<bool, AppError> {
        loop {
            if current == root {
                return Ok(true);
            }
            match self
                .stores
                .blocs
                .find(current)
                .await?
                .and_then(|b| b.parent())
            {
                Some(parent) => current = parent,
                None => return Ok(false),
            }
        }
    }

    /// Moves a bloc into a new container, keeping both parents' aggregates
    /// consistent. `carried_weight` is the recorded weight the bloc takes
    /// into the new parent when the surrounding update also changes it; the
    /// old parent always gives up the current recorded weight. The new
    /// parent is fully validated before anything is written.
    async fn move_to_container(
        &self,
        bloc: &mut Bloc,
        target: Container,
        carried_weight: Option<f64>,
    ) -> Result<(), AppError> {
        if bloc.container == target {
            return Ok(());
        }

        let outgoing = bloc.recorded_weight();
        let incoming = carried_weight.unwrap_or(outgoing);
        let mut new_parent = None;
        if let Container::Child(pid) = target {
            let parent = self
                .stores
                .blocs
                .find(pid)
                .await?
                .ok_or(AppError::ParentNotFound)?;
            if parent.warehouse != bloc.warehouse {
                return Err(AppError::WrongWarehouse);
            }
            if self.is_descendant(bloc.id, pid).await? {
                return Err(AppError::CycleDetected);
            }
            if !can_accommodate(parent.weight, parent.max_weight, incoming) {
                return Err(AppError::CapacityExceeded {
                    current: parent.recorded_weight(),
                    limit: parent.max_weight.unwrap_or(0.0),
                    delta: incoming,
                });
            }
            new_parent = Some(parent);
        }

        if let Some(old_pid) = bloc.parent() {
            if let Some(mut old_parent) = self.stores.blocs.find(old_pid).await? {
                if outgoing != 0.0 {
                    subtract_weight(&mut old_parent, outgoing);
                    old_parent.touch();
                    self.stores.blocs.update(&old_parent).await?;
                }
            }
        }
        if let Some(mut parent) = new_parent {
            if incoming != 0.0 {
                parent.weight = Some(parent.recorded_weight() + incoming);
                parent.touch();
                self.stores.blocs.update(&parent).await?;
            }
        }

        if let Some(weight) = carried_weight {
            bloc.weight = Some(weight);
        }
        bloc.container = target;
        bloc.touch();
        self.stores.blocs.update(bloc).await
    }

    pub async fn change_parent(
        &self,
        id: Uuid,
        new_parent: Option<Uuid>,
        actor: UserRef,
    ) -> Result<Bloc, AppError> {
        let mut bloc = self
            .stores
            .blocs
            .find(id)
            .await?
            .ok_or(AppError::BlocNotFound)?;
        self.warehouse_guard(bloc.warehouse, actor, WRITE_ROLES)
            .await?;
        self.move_to_container(&mut bloc, Container::from_parent(new_parent), None)
            .await?;
        Ok(bloc)
    }

    /// Batch reparent: each id is handled independently. Ids that do not
    /// resolve are skipped, per-item failures (capacity, cycle) are recorded
    /// and the iteration continues.
    pub async fn change_parents_batch(
        &self,
        ids: &[Uuid],
        new_parent: Option<Uuid>,
        actor: UserRef,
    ) -> Result<Vec<BatchItem>, AppError> {
        let target = Container::from_parent(new_parent);
        let mut results = Vec::with_capacity(ids.len());
        for &id in ids {
            let Some(mut bloc) = self.stores.blocs.find(id).await? else {
                results.push(BatchItem::skipped(id));
                continue;
            };
            let moved = match self
                .warehouse_guard(bloc.warehouse, actor, WRITE_ROLES)
                .await
            {
                Ok(_) => self.move_to_container(&mut bloc, target, None).await,
                Err(err) => Err(err),
            };
            results.push(match moved {
                Ok(()) => BatchItem::updated(id),
                Err(err) => BatchItem::failed(id, &err),
            });
        }
        Ok(results)
    }

    /// Sets a bloc's own weight, pushing the delta into the parent aggregate
    /// after a capacity check.
    pub(crate) async fn apply_weight(
        &self,
        bloc: &mut Bloc,
        new_weight: f64,
    ) -> Result<(), AppError> {
        let delta = new_weight - bloc.recorded_weight();
        if delta != 0.0 {
            if let Some(pid) = bloc.parent() {
                let mut parent = self
                    .stores
                    .blocs
                    .find(pid)
                    .await?
                    .ok_or(AppError::ParentNotFound)?;
                if !can_accommodate(parent.weight, parent.max_weight, delta) {
                    return Err(AppError::CapacityExceeded {
                        current: parent.recorded_weight(),
                        limit: parent.max_weight.unwrap_or(0.0),
                        delta,
                    });
                }
                parent.weight = Some((parent.recorded_weight() + delta).max(0.0));
                parent.touch();
                self.stores.blocs.update(&parent).await?;
            }
        }
        bloc.weight = Some(new_weight);
        Ok(())
    }

    pub async fn update_bloc(
        &self,
        id: Uuid,
        patch: BlocPatch,
        actor: UserRef,
    ) -> Result<Bloc, AppError> {
        let mut bloc = self
            .stores
            .blocs
            .find(id)
            .await?
            .ok_or(AppError::BlocNotFound)?;
        self.warehouse_guard(bloc.warehouse, actor, WRITE_ROLES)
            .await?;

        if let Some(name) = patch.name {
            bloc.name = name;
        }
        if let Some(width) = patch.width {
            bloc.width = Some(width);
        }
        if let Some(height) = patch.height {
            bloc.height = Some(height);
        }
        if let Some(depth) = patch.depth {
            bloc.depth = Some(depth);
        }
        if let Some(max_weight) = patch.max_weight {
            bloc.max_weight = Some(max_weight);
        }
        if let Some(position) = patch.position {
            bloc.position = position;
        }
        if let Some(picture) = patch.picture {
            bloc.picture = Some(picture);
        }
        if let Some(custom_fields) = patch.custom_fields {
            bloc.custom_fields = custom_fields;
        }
        if let Some(tags) = patch.tags {
            bloc.tags = self.normalize_tags(tags).await?;
        }
        // Weight and container changes are validated together, before either
        // writes: a rejected move must not leave a half-applied weight in the
        // old parent's aggregate.
        match patch.parent {
            Some(target) if target != bloc.container => {
                self.move_to_container(&mut bloc, target, patch.weight)
                    .await?;
            }
            _ => {
                if let Some(weight) = patch.weight {
                    self.apply_weight(&mut bloc, weight).await?;
                }
            }
        }
        if let Some(warehouse) = patch.warehouse {
            if warehouse != bloc.warehouse {
                self.stores
                    .warehouses
                    .find(warehouse)
                    .await?
                    .ok_or(AppError::WarehouseNotFound)?;
                // Single-bloc re-stamp only; the subtree stays where it is.
                bloc.warehouse = warehouse;
            }
        }

        bloc.touch();
        self.stores.blocs.update(&bloc).await?;
        Ok(bloc)
    }

    /// Migrates a bloc and its whole subtree to another warehouse. The moved
    /// bloc is detached from its old parent and becomes a root of the target;
    /// every descendant is re-stamped with the new warehouse id while the
    /// parent links inside the subtree stay untouched.
    pub async fn change_warehouse(
        &self,
        id: Uuid,
        new_warehouse: Uuid,
        actor: UserRef,
    ) -> Result<Bloc, AppError> {
        let mut bloc = self
            .stores
            .blocs
            .find(id)
            .await?
            .ok_or(AppError::BlocNotFound)?;
        self.warehouse_guard(bloc.warehouse, actor, WRITE_ROLES)
            .await?;
        self.warehouse_guard(new_warehouse, actor, WRITE_ROLES)
            .await?;
        if bloc.warehouse == new_warehouse {
            return Ok(bloc);
        }

        self.move_to_container(&mut bloc, Container::Root, None)
            .await?;
        bloc.warehouse = new_warehouse;
        bloc.touch();
        self.stores.blocs.update(&bloc).await?;

        // Breadth-first re-stamp with an explicit queue.
        let mut queue = VecDeque::from([bloc.id]);
        while let Some(next) = queue.pop_front() {
            for mut child in self.stores.blocs.children_of(next).await? {
                child.warehouse = new_warehouse;
                child.touch();
                self.stores.blocs.update(&child).await?;
                queue.push_back(child.id);
            }
        }

        tracing::info!(bloc = %id, warehouse = %new_warehouse, "bloc subtree migrated");
        Ok(bloc)
    }

    /// Canvas position update for a single bloc.
    pub async fn move_bloc(
        &self,
        id: Uuid,
        position: Position,
        actor: UserRef,
    ) -> Result<Bloc, AppError> {
        let mut bloc = self
            .stores
            .blocs
            .find(id)
            .await?
            .ok_or(AppError::BlocNotFound)?;
        self.warehouse_guard(bloc.warehouse, actor, WRITE_ROLES)
            .await?;
        bloc.position = position;
        bloc.touch();
        self.stores.blocs.update(&bloc).await?;
        Ok(bloc)
    }

    /// Canvas position update for many blocs at once; missing ids are
    /// skipped.
    pub async fn move_blocs(
        &self,
        moves: &[(Uuid, Position)],
        actor: UserRef,
    ) -> Result<Vec<BatchItem>, AppError> {
        let mut results = Vec::with_capacity(moves.len());
        for &(id, position) in moves {
            let Some(mut bloc) = self.stores.blocs.find(id).await? else {
                results.push(BatchItem::skipped(id));
                continue;
            };
            match self
                .warehouse_guard(bloc.warehouse, actor, WRITE_ROLES)
                .await
            {
                Ok(_) => {
                    bloc.position = position;
                    bloc.touch();
                    self.stores.blocs.update(&bloc).await?;
                    results.push(BatchItem::updated(id));
                }
                Err(err) => results.push(BatchItem::failed(id, &err)),
            }
        }
        Ok(results)
    }

    pub async fn get_bloc(&self, id: Uuid, actor: UserRef) -> Result<BlocDetail, AppError> {
        let bloc = self
            .stores
            .blocs
            .find(id)
            .await?
            .ok_or(AppError::BlocNotFound)?;
        self.warehouse_guard(bloc.warehouse, actor, READ_ROLES)
            .await?;
        let children = self.stores.blocs.children_of(id).await?;

        let mut ancestors = Vec::new();
        let mut cursor = bloc.parent();
        while let Some(pid) = cursor {
            match self.stores.blocs.find(pid).await? {
                Some(ancestor) => {
                    cursor = ancestor.parent();
                    ancestors.push(ancestor);
                }
                None => break,
            }
        }

        Ok(BlocDetail {
            bloc,
            children,
            ancestors,
        })
    }

    pub async fn get_many(&self, ids: &[Uuid], actor: UserRef) -> Result<Vec<Bloc>, AppError> {
        let blocs = self.stores.blocs.find_many(ids).await?;
        // every returned bloc must be readable by the actor
        let mut checked: HashSet<Uuid> = HashSet::new();
        for bloc in &blocs {
            if checked.insert(bloc.warehouse) {
                self.warehouse_guard(bloc.warehouse, actor, READ_ROLES)
                    .await?;
            }
        }
        Ok(blocs)
    }

    pub async fn roots(&self, warehouse: Uuid, actor: UserRef) -> Result<Vec<Bloc>, AppError> {
        self.warehouse_guard(warehouse, actor, READ_ROLES).await?;
        self.stores.blocs.roots_of(warehouse).await
    }
}

/// Aggregate weights never go negative, even if earlier drift left the
/// parent's record short.
fn subtract_weight(bloc: &mut Bloc, weight: f64) {
    if let Some(current) = bloc.weight {
        bloc.weight = Some((current - weight).max(0.0));
    }
}
