use serde::{Deserialize, Serialize};

use crate::model::RoleView;

/// An account record. Holds the salted password hash — never the raw
/// password — and is never serialized to API responses directly; see
/// [`UserView`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique identifier (UUIDv4, no dashes).
    pub id: String,

    /// Unique email address.
    pub email: String,

    /// Unique login name.
    pub user_name: String,

    pub first_name: String,

    pub last_name: String,

    /// argon2id PHC string. Salt is embedded, so the same raw password
    /// hashes differently across accounts.
    pub password_hash: String,

    /// RFC 3339 creation timestamp.
    pub created_at: String,

    /// RFC 3339 last update timestamp.
    pub updated_at: String,
}

/// Signup request body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUp {
    pub email: String,
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    pub password: String,
}

/// External representation of a user: roles expanded to [`RoleView`]
/// (which in turn expands permissions to pairs). No credential
/// material.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub user_name: String,
    pub first_name: String,
    pub last_name: String,
    pub roles: Vec<RoleView>,
}

/// Response payload for signup and login: the expanded user plus a
/// freshly issued token.
#[derive(Debug, Clone, Serialize)]
pub struct AuthPayload {
    pub user: UserView,
    pub token: String,
}
