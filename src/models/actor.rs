use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identity of the caller. Accounts and credentials live in a
/// separate service; all we ever see here is the subject id carried by the
/// bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: Uuid,
}

impl UserRef {
    pub fn new(id: Uuid) -> Self {
        Self { id }
    }
}
