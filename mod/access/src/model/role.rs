use serde::{Deserialize, Serialize};

use crate::model::PermissionPair;

/// A named bundle of permission references.
///
/// The permission set itself lives in the `role_permissions` join
/// table, not on this record; [`RoleView`] is the expanded external
/// representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    /// Unique identifier (UUIDv4, no dashes).
    pub id: String,

    /// Unique role name, trimmed and non-empty.
    pub name: String,

    /// RFC 3339 creation timestamp.
    pub created_at: String,

    /// RFC 3339 last update timestamp.
    pub updated_at: String,
}

/// Input for creating a role. Permission pairs are resolved
/// create-if-missing before the role is stored.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRole {
    pub name: String,

    #[serde(default)]
    pub permissions: Vec<PermissionPair>,
}

/// External representation of a role: permissions are exposed as
/// `(action, subject)` pairs in insertion order, never as internal
/// ids.
#[derive(Debug, Clone, Serialize)]
pub struct RoleView {
    pub id: String,
    pub name: String,
    pub permissions: Vec<PermissionPair>,
}
