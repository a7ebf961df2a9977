//! Read-time reference expansion.
//!
//! References are stored as ids in join tables; external
//! representations carry the referenced records instead. Expansion is
//! an explicit fan-out query here, issued per read — authorization
//! state is therefore always current, never a cached snapshot.

use warden_sql::Value;

use crate::model::{PermissionPair, Role, RoleView, User, UserView};
use crate::service::{AccessError, AccessService};

impl AccessService {
    /// The `(action, subject)` pairs referenced by a role, in the
    /// order they were attached.
    pub(crate) fn role_permission_pairs(
        &self,
        role_id: &str,
    ) -> Result<Vec<PermissionPair>, AccessError> {
        let rows = self.sql
            .query(
                "SELECT p.action AS action, p.subject AS subject
                 FROM role_permissions rp
                 JOIN permissions p ON p.id = rp.permission_id
                 WHERE rp.role_id = ?1
                 ORDER BY rp.rowid",
                &[Value::Text(role_id.to_string())],
            )
            .map_err(|e| AccessError::Storage(e.to_string()))?;

        let mut pairs = Vec::with_capacity(rows.len());
        for row in &rows {
            let action = row
                .get_str("action")
                .ok_or_else(|| AccessError::Internal("missing action column".into()))?;
            let subject = row
                .get_str("subject")
                .ok_or_else(|| AccessError::Internal("missing subject column".into()))?;
            pairs.push((action.to_string(), subject.to_string()));
        }
        Ok(pairs)
    }

    /// Expand a role record into its external representation.
    pub(crate) fn expand_role(&self, role: &Role) -> Result<RoleView, AccessError> {
        Ok(RoleView {
            id: role.id.clone(),
            name: role.name.clone(),
            permissions: self.role_permission_pairs(&role.id)?,
        })
    }

    /// The roles referenced by a user, in attachment order.
    pub(crate) fn user_role_records(
        &self,
        user_id: &str,
    ) -> Result<Vec<Role>, AccessError> {
        let rows = self.sql
            .query(
                "SELECT r.data AS data
                 FROM user_roles ur
                 JOIN roles r ON r.id = ur.role_id
                 WHERE ur.user_id = ?1
                 ORDER BY ur.rowid",
                &[Value::Text(user_id.to_string())],
            )
            .map_err(|e| AccessError::Storage(e.to_string()))?;

        let mut roles = Vec::with_capacity(rows.len());
        for row in &rows {
            let data = row
                .get_str("data")
                .ok_or_else(|| AccessError::Internal("missing data column".into()))?;
            let role: Role = serde_json::from_str(data)
                .map_err(|e| AccessError::Internal(e.to_string()))?;
            roles.push(role);
        }
        Ok(roles)
    }

    /// Expand a user record into its external representation: roles
    /// with their nested permission pairs, no credential material.
    pub(crate) fn expand_user(&self, user: &User) -> Result<UserView, AccessError> {
        let mut roles = Vec::new();
        for role in self.user_role_records(&user.id)? {
            roles.push(self.expand_role(&role)?);
        }
        Ok(UserView {
            id: user.id.clone(),
            email: user.email.clone(),
            user_name: user.user_name.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            roles,
        })
    }
}
