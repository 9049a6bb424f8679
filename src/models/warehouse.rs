use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::UserRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "warehouse_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Member,
    Guest,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub user: Uuid,
    pub role: Role,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub address: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Warehouse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub location: Location,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub depth: Option<f64>,
    pub max_weight: Option<f64>,
    pub owner: Uuid,
    pub members: Vec<Member>,
    pub plan_image: Option<String>,
    pub invite_token: Option<String>,
    pub invite_role: Option<Role>,
    pub invite_expires: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub last_update: DateTime<Utc>,
}

impl Warehouse {
    /// The owner is treated as an implicit ADMIN.
    pub fn role_of(&self, user: Uuid) -> Option<Role> {
        if self.owner == user {
            return Some(Role::Admin);
        }
        self.members.iter().find(|m| m.user == user).map(|m| m.role)
    }

    pub fn permits(&self, actor: UserRef, required: &[Role]) -> bool {
        match self.role_of(actor.id) {
            Some(role) => required.contains(&role),
            None => false,
        }
    }
}

/// Role sets used by the services when gating operations.
pub const READ_ROLES: &[Role] = &[Role::Admin, Role::Member, Role::Guest];
pub const WRITE_ROLES: &[Role] = &[Role::Admin, Role::Member];
pub const ADMIN_ROLES: &[Role] = &[Role::Admin];
