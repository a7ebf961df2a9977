use serde::{Deserialize, Serialize};

/// An `(action, subject)` pair as it appears on the wire when
/// attaching or detaching permissions, e.g. `["read", "report"]`.
pub type PermissionPair = (String, String);

/// An atomic capability: what may be done (`action`) to what
/// (`subject`). The pair is unique across the directory and both
/// parts are stored trimmed and lowercased.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Permission {
    /// Unique identifier (UUIDv4, no dashes).
    pub id: String,

    pub action: String,

    pub subject: String,

    /// RFC 3339 creation timestamp.
    pub created_at: String,

    /// RFC 3339 last update timestamp.
    pub updated_at: String,
}

/// Input for creating a permission.
#[derive(Debug, Clone, Deserialize)]
pub struct PermissionInput {
    pub action: String,
    pub subject: String,
}

/// Partial update for a permission. Absent fields keep their current
/// value; the resulting pair must not collide with a different
/// permission.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PermissionPatch {
    #[serde(default)]
    pub action: Option<String>,

    #[serde(default)]
    pub subject: Option<String>,
}
