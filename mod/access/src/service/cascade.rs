//! Cascading reference cleanup.
//!
//! Reference sets are never validated at read time, so deletion is the
//! only place dangling ids could be born. Each strip runs as a single
//! bulk delete *before* the owning record is removed: the worst a
//! concurrent reader can observe is an entity that nothing references
//! any more, never a reference to an entity that is gone.

use warden_sql::Value;

use crate::service::{AccessError, AccessService};

impl AccessService {
    /// Remove a permission id from every role's permission set.
    /// Returns the number of references stripped.
    pub(crate) fn strip_permission_from_roles(
        &self,
        permission_id: &str,
    ) -> Result<u64, AccessError> {
        let stripped = self.sql
            .exec(
                "DELETE FROM role_permissions WHERE permission_id = ?1",
                &[Value::Text(permission_id.to_string())],
            )
            .map_err(|e| AccessError::Storage(e.to_string()))?;
        if stripped > 0 {
            tracing::debug!(permission_id, stripped, "stripped permission from roles");
        }
        Ok(stripped)
    }

    /// Remove a role id from every user's role set.
    /// Returns the number of references stripped.
    pub(crate) fn strip_role_from_users(
        &self,
        role_id: &str,
    ) -> Result<u64, AccessError> {
        let stripped = self.sql
            .exec(
                "DELETE FROM user_roles WHERE role_id = ?1",
                &[Value::Text(role_id.to_string())],
            )
            .map_err(|e| AccessError::Storage(e.to_string()))?;
        if stripped > 0 {
            tracing::debug!(role_id, stripped, "stripped role from users");
        }
        Ok(stripped)
    }
}
