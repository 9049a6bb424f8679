// Query/search layer: filtered, sorted listing over the blocs of one
// warehouse. A thin pass over the repository, not an index.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::str::FromStr;

use serde::Serialize;
use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::Stores;
use crate::models::warehouse::READ_ROLES;
use crate::models::{Bloc, Tag, UserRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Name,
    Weight,
    CreatedAt,
    LastUpdate,
}

impl FromStr for SortField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SortField::Name),
            "weight" => Ok(SortField::Weight),
            "createdAt" | "created_at" => Ok(SortField::CreatedAt),
            "lastUpdate" | "last_update" => Ok(SortField::LastUpdate),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy)]
pub struct SortKey {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortKey {
    /// Parses `"name:asc,weight:desc"`; unknown fields are ignored, a
    /// missing direction means ascending.
    pub fn parse_list(spec: &str) -> Vec<SortKey> {
        spec.split(',')
            .filter_map(|part| {
                let part = part.trim();
                if part.is_empty() {
                    return None;
                }
                let (field, direction) = match part.split_once(':') {
                    Some((f, d)) => (f, d),
                    None => (part, "asc"),
                };
                let field = SortField::from_str(field).ok()?;
                let direction = if direction.eq_ignore_ascii_case("desc") {
                    SortDirection::Desc
                } else {
                    SortDirection::Asc
                };
                Some(SortKey { field, direction })
            })
            .collect()
    }
}

/// A bloc with the context the listing screens render.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHit {
    #[serde(flatten)]
    pub bloc: Bloc,
    pub parent_name: Option<String>,
    pub resolved_tags: Vec<Tag>,
}

#[derive(Clone)]
pub struct SearchService {
    stores: Stores,
}

impl SearchService {
    pub fn new(stores: Stores) -> Self {
        Self { stores }
    }

    /// Case-insensitive substring match on name (empty matches all), an
    /// optional required tag intersection, then the sort keys in order.
    pub async fn search_blocs(
        &self,
        warehouse: Uuid,
        text: Option<&str>,
        tag_filter: &[Uuid],
        sort: &[SortKey],
        actor: UserRef,
    ) -> Result<Vec<SearchHit>, AppError> {
        let warehouse_record = self
            .stores
            .warehouses
            .find(warehouse)
            .await?
            .ok_or(AppError::WarehouseNotFound)?;
        if !warehouse_record.permits(actor, READ_ROLES) {
            return Err(AppError::PermissionDenied);
        }

        let blocs = self.stores.blocs.in_warehouse(warehouse).await?;
        let names: HashMap<Uuid, String> =
            blocs.iter().map(|b| (b.id, b.name.clone())).collect();
        let tags: HashMap<Uuid, Tag> = self
            .stores
            .tags
            .in_warehouse(warehouse)
            .await?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();

        let needle = text.unwrap_or("").to_lowercase();
        let mut hits: Vec<SearchHit> = blocs
            .into_iter()
            .filter(|b| needle.is_empty() || b.name.to_lowercase().contains(&needle))
            .filter(|b| {
                tag_filter.is_empty() || b.tags.iter().any(|t| tag_filter.contains(t))
            })
            .map(|b| SearchHit {
                parent_name: b.parent().and_then(|p| names.get(&p).cloned()),
                resolved_tags: b
                    .tags
                    .iter()
                    .filter_map(|t| tags.get(t).cloned())
                    .collect(),
                bloc: b,
            })
            .collect();

        hits.sort_by(|a, b| compare(&a.bloc, &b.bloc, sort));
        Ok(hits)
    }
}

fn compare(a: &Bloc, b: &Bloc, sort: &[SortKey]) -> Ordering {
    for key in sort {
        let ordering = match key.field {
            SortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortField::Weight => a
                .recorded_weight()
                .partial_cmp(&b.recorded_weight())
                .unwrap_or(Ordering::Equal),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::LastUpdate => a.last_update.cmp(&b.last_update),
        };
        let ordering = match key.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}
