use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

/// Where a bloc lives: at the root of its warehouse, or inside another bloc.
///
/// Modelled as a single tagged value instead of two independently settable
/// fields, so "a bloc is in exactly one container" holds by construction.
/// The warehouse root list and the children lists are derived from this at
/// query time, never stored alongside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Container {
    #[default]
    Root,
    Child(Uuid),
}

impl Container {
    pub fn from_parent(parent: Option<Uuid>) -> Self {
        match parent {
            Some(p) => Container::Child(p),
            None => Container::Root,
        }
    }

    pub fn parent(self) -> Option<Uuid> {
        match self {
            Container::Child(p) => Some(p),
            Container::Root => None,
        }
    }

    pub fn is_root(self) -> bool {
        matches!(self, Container::Root)
    }
}

// On the wire a container is just `parent: <id> | null`, which is what the
// original clients expect.
impl Serialize for Container {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.parent().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Container {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Container::from_parent(Option::<Uuid>::deserialize(
            deserializer,
        )?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    pub field: Uuid,
    pub value: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bloc {
    pub id: Uuid,
    pub name: String,
    pub picture: Option<String>,
    #[serde(rename = "parent")]
    pub container: Container,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub depth: Option<f64>,
    /// Aggregate weight: the bloc's own weight plus the recorded weights of
    /// its direct children, maintained on every mutation.
    pub weight: Option<f64>,
    /// Ceiling on the recorded aggregate weight.
    pub max_weight: Option<f64>,
    pub position: Position,
    pub tags: Vec<Uuid>,
    pub custom_fields: Vec<CustomField>,
    pub warehouse: Uuid,
    pub added_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
}

impl Bloc {
    pub fn parent(&self) -> Option<Uuid> {
        self.container.parent()
    }

    /// Weight as it participates in the parent's aggregate.
    pub fn recorded_weight(&self) -> f64 {
        self.weight.unwrap_or(0.0)
    }

    pub fn touch(&mut self) {
        self.last_update = Utc::now();
    }
}
