use serde::{Deserialize, Serialize};

/// JWT claims. Deliberately minimal: the user id only.
///
/// Roles and permissions are never embedded — every authenticated
/// request re-resolves the live user record, so authorization
/// decisions always see current data rather than a token-time
/// snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,

    /// Issued-at (unix seconds).
    pub iat: i64,

    /// Expiry (unix seconds).
    pub exp: i64,
}
