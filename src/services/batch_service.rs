// Batch mutation engine: applies one mutation to a list of bloc ids,
// independently per item. Missing ids are skipped, individual failures are
// recorded, and the remainder is always processed; the caller gets a
// per-id outcome list instead of a single pass/fail flag.

use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::warehouse::WRITE_ROLES;
use crate::models::{Bloc, UserRef};

use super::{BatchItem, BlocService};

/// Dimension fields of a batch resize; only the provided subset is applied.
#[derive(Debug, Clone, Copy, Default)]
pub struct DimensionsPatch {
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub depth: Option<f64>,
    pub weight: Option<f64>,
}

#[derive(Clone)]
pub struct BatchService {
    containment: BlocService,
}

impl BatchService {
    pub fn new(containment: BlocService) -> Self {
        Self { containment }
    }

    /// Loads the bloc and checks write access on its warehouse. `Ok(None)`
    /// means the id did not resolve and the item is to be skipped.
    async fn load_for_write(
        &self,
        id: Uuid,
        actor: UserRef,
    ) -> Result<Option<Bloc>, AppError> {
        let Some(bloc) = self.containment.stores().blocs.find(id).await? else {
            return Ok(None);
        };
        self.containment
            .warehouse_guard(bloc.warehouse, actor, WRITE_ROLES)
            .await?;
        Ok(Some(bloc))
    }

    /// Renames every bloc in the list: one shared literal name, or
    /// `{name}_{index+1}` following the input order.
    pub async fn rename(
        &self,
        ids: &[Uuid],
        name: &str,
        same_name_for_all: bool,
        actor: UserRef,
    ) -> Result<Vec<BatchItem>, AppError> {
        let mut results = Vec::with_capacity(ids.len());
        for (index, &id) in ids.iter().enumerate() {
            let item = match self.load_for_write(id, actor).await {
                Ok(None) => BatchItem::skipped(id),
                Ok(Some(mut bloc)) => {
                    bloc.name = if same_name_for_all {
                        name.to_string()
                    } else {
                        format!("{}_{}", name, index + 1)
                    };
                    bloc.touch();
                    self.containment.stores().blocs.update(&bloc).await?;
                    BatchItem::updated(id)
                }
                Err(err) => BatchItem::failed(id, &err),
            };
            results.push(item);
        }
        Ok(results)
    }

    /// Applies the provided dimension fields to every bloc. Weight changes
    /// go through the same parent-delta capacity check as a single update;
    /// a capacity failure is recorded for that id and the rest continue.
    pub async fn resize(
        &self,
        ids: &[Uuid],
        dims: DimensionsPatch,
        actor: UserRef,
    ) -> Result<Vec<BatchItem>, AppError> {
        let mut results = Vec::with_capacity(ids.len());
        for &id in ids {
            let item = match self.load_for_write(id, actor).await {
                Ok(None) => BatchItem::skipped(id),
                Ok(Some(mut bloc)) => {
                    if let Some(width) = dims.width {
                        bloc.width = Some(width);
                    }
                    if let Some(height) = dims.height {
                        bloc.height = Some(height);
                    }
                    if let Some(depth) = dims.depth {
                        bloc.depth = Some(depth);
                    }
                    let applied = match dims.weight {
                        Some(weight) => self.containment.apply_weight(&mut bloc, weight).await,
                        None => Ok(()),
                    };
                    match applied {
                        Ok(()) => {
                            bloc.touch();
                            self.containment.stores().blocs.update(&bloc).await?;
                            BatchItem::updated(id)
                        }
                        Err(err) => BatchItem::failed(id, &err),
                    }
                }
                Err(err) => BatchItem::failed(id, &err),
            };
            results.push(item);
        }
        Ok(results)
    }

    /// Applies a tag list to every bloc, either replacing the existing set
    /// or adding to it. Already-present tags are not re-added.
    pub async fn retag(
        &self,
        ids: &[Uuid],
        tags: Vec<Uuid>,
        remove_other_tags: bool,
        actor: UserRef,
    ) -> Result<Vec<BatchItem>, AppError> {
        let tags = self.containment.normalize_tags(tags).await?;
        let mut results = Vec::with_capacity(ids.len());
        for &id in ids {
            let item = match self.load_for_write(id, actor).await {
                Ok(None) => BatchItem::skipped(id),
                Ok(Some(mut bloc)) => {
                    if remove_other_tags {
                        bloc.tags = tags.clone();
                    } else {
                        for &tag in &tags {
                            if !bloc.tags.contains(&tag) {
                                bloc.tags.push(tag);
                            }
                        }
                    }
                    bloc.touch();
                    self.containment.stores().blocs.update(&bloc).await?;
                    BatchItem::updated(id)
                }
                Err(err) => BatchItem::failed(id, &err),
            };
            results.push(item);
        }
        Ok(results)
    }

    /// Points every bloc's picture at one stored blob URL.
    pub async fn set_picture(
        &self,
        ids: &[Uuid],
        picture: &str,
        actor: UserRef,
    ) -> Result<Vec<BatchItem>, AppError> {
        let mut results = Vec::with_capacity(ids.len());
        for &id in ids {
            let item = match self.load_for_write(id, actor).await {
                Ok(None) => BatchItem::skipped(id),
                Ok(Some(mut bloc)) => {
                    bloc.picture = Some(picture.to_string());
                    bloc.touch();
                    self.containment.stores().blocs.update(&bloc).await?;
                    BatchItem::updated(id)
                }
                Err(err) => BatchItem::failed(id, &err),
            };
            results.push(item);
        }
        Ok(results)
    }
}
