use warden_core::{ListParams, ListResult, new_id, now_rfc3339};
use warden_sql::Value;

use crate::model::{CreateRole, PermissionPair, Role, RoleView};
use crate::service::permission::OnMissing;
use crate::service::{AccessError, AccessService};

impl AccessService {
    /// Create a new role with an initial permission set.
    ///
    /// Permission pairs are resolved create-if-missing. An empty set
    /// is allowed — there is no minimum-permissions invariant.
    pub fn create_role(&self, input: CreateRole) -> Result<RoleView, AccessError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(AccessError::Validation("role name cannot be empty".into()));
        }
        if self.find_role_by_name(&name)?.is_some() {
            return Err(AccessError::Conflict(format!(
                "role '{}' already exists",
                name,
            )));
        }

        let permissions = self.resolve_permissions(&input.permissions, OnMissing::CreateNew)?;

        let now = now_rfc3339();
        let role = Role {
            id: new_id(),
            name,
            created_at: now.clone(),
            updated_at: now.clone(),
        };

        self.insert_record(
            "roles",
            &role.id,
            &role,
            &[
                ("name", Value::Text(role.name.clone())),
                ("created_at", Value::Text(now.clone())),
                ("updated_at", Value::Text(now)),
            ],
        )?;
        self.attach_permissions(&role.id, &permissions.iter().map(|p| p.id.clone()).collect::<Vec<_>>())?;

        self.expand_role(&role)
    }

    /// Get a role by id, permissions expanded.
    pub fn get_role(&self, id: &str) -> Result<RoleView, AccessError> {
        let role: Role = self.get_record("roles", id)?;
        self.expand_role(&role)
    }

    /// List roles with pagination, permissions expanded.
    pub fn list_roles(&self, params: &ListParams) -> Result<ListResult<RoleView>, AccessError> {
        let (items, total): (Vec<Role>, usize) =
            self.list_records("roles", params.limit, params.skip)?;
        let mut views = Vec::with_capacity(items.len());
        for role in &items {
            views.push(self.expand_role(role)?);
        }
        Ok(ListResult { items: views, total })
    }

    /// Rename a role. Fails with a conflict if the new name belongs to
    /// a different role.
    pub fn rename_role(&self, id: &str, new_name: &str) -> Result<RoleView, AccessError> {
        let mut role: Role = self.get_record("roles", id)?;

        let new_name = new_name.trim().to_string();
        if new_name.is_empty() {
            return Err(AccessError::Validation("role name cannot be empty".into()));
        }
        if let Some(existing) = self.find_role_by_name(&new_name)? {
            if existing.id != role.id {
                return Err(AccessError::Conflict(format!(
                    "role '{}' already exists",
                    new_name,
                )));
            }
        }

        let now = now_rfc3339();
        role.name = new_name;
        role.updated_at = now.clone();

        self.update_record(
            "roles",
            id,
            &role,
            &[
                ("name", Value::Text(role.name.clone())),
                ("updated_at", Value::Text(now)),
            ],
        )?;
        self.expand_role(&role)
    }

    /// Attach permission pairs to a role, set-union semantics:
    /// already-present references are no-ops. Missing permissions are
    /// created.
    pub fn add_role_permissions(
        &self,
        id: &str,
        pairs: &[PermissionPair],
    ) -> Result<RoleView, AccessError> {
        let role: Role = self.get_record("roles", id)?;
        let permissions = self.resolve_permissions(pairs, OnMissing::CreateNew)?;
        self.attach_permissions(&role.id, &permissions.iter().map(|p| p.id.clone()).collect::<Vec<_>>())?;
        self.expand_role(&role)
    }

    /// Detach permission pairs from a role. Pairs that do not resolve
    /// to a permission, or that the role does not hold, are no-ops.
    pub fn remove_role_permissions(
        &self,
        id: &str,
        pairs: &[PermissionPair],
    ) -> Result<RoleView, AccessError> {
        let role: Role = self.get_record("roles", id)?;
        let permissions = self.resolve_permissions(pairs, OnMissing::Skip)?;
        for permission in &permissions {
            self.sql
                .exec(
                    "DELETE FROM role_permissions WHERE role_id = ?1 AND permission_id = ?2",
                    &[
                        Value::Text(role.id.clone()),
                        Value::Text(permission.id.clone()),
                    ],
                )
                .map_err(|e| AccessError::Storage(e.to_string()))?;
        }
        self.expand_role(&role)
    }

    /// Delete a role by id, stripping its id from every user's role
    /// set first.
    pub fn delete_role(&self, id: &str) -> Result<Role, AccessError> {
        let role: Role = self.get_record("roles", id)?;

        self.strip_role_from_users(&role.id)?;

        // The role's own reference rows go with it.
        self.sql
            .exec(
                "DELETE FROM role_permissions WHERE role_id = ?1",
                &[Value::Text(role.id.clone())],
            )
            .map_err(|e| AccessError::Storage(e.to_string()))?;

        self.delete_record("roles", &role.id)?;
        Ok(role)
    }

    /// Find roles by name. Unmatched names are silently omitted —
    /// callers attaching roles to a user simply drop unknown names.
    pub fn find_roles_by_names(&self, names: &[String]) -> Result<Vec<Role>, AccessError> {
        let mut roles = Vec::new();
        for name in names {
            if let Some(role) = self.find_role_by_name(name.trim())? {
                roles.push(role);
            }
        }
        Ok(roles)
    }

    /// Find a single role by exact name.
    pub fn find_role_by_name(&self, name: &str) -> Result<Option<Role>, AccessError> {
        let rows = self.sql
            .query(
                "SELECT data FROM roles WHERE name = ?1",
                &[Value::Text(name.to_string())],
            )
            .map_err(|e| AccessError::Storage(e.to_string()))?;
        match rows.first().and_then(|r| r.get_str("data")) {
            Some(data) => serde_json::from_str(data)
                .map(Some)
                .map_err(|e| AccessError::Internal(e.to_string())),
            None => Ok(None),
        }
    }

    /// Insert role -> permission references, ignoring duplicates.
    fn attach_permissions(
        &self,
        role_id: &str,
        permission_ids: &[String],
    ) -> Result<(), AccessError> {
        let now = now_rfc3339();
        for permission_id in permission_ids {
            self.sql
                .exec(
                    "INSERT OR IGNORE INTO role_permissions (role_id, permission_id, added_at)
                     VALUES (?1, ?2, ?3)",
                    &[
                        Value::Text(role_id.to_string()),
                        Value::Text(permission_id.clone()),
                        Value::Text(now.clone()),
                    ],
                )
                .map_err(|e| AccessError::Storage(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::test_service;

    #[test]
    fn test_role_crud() {
        let svc = test_service();

        let role = svc
            .create_role(CreateRole {
                name: "auditor".into(),
                permissions: vec![
                    ("read".into(), "report".into()),
                    ("read".into(), "invoice".into()),
                ],
            })
            .unwrap();
        assert_eq!(role.name, "auditor");
        assert_eq!(
            role.permissions,
            vec![
                ("read".into(), "report".into()),
                ("read".into(), "invoice".into()),
            ],
        );

        let fetched = svc.get_role(&role.id).unwrap();
        assert_eq!(fetched.permissions.len(), 2);

        let list = svc.list_roles(&ListParams::default()).unwrap();
        assert_eq!(list.total, 1);
        assert_eq!(list.items[0].permissions.len(), 2);

        svc.delete_role(&role.id).unwrap();
        assert!(svc.get_role(&role.id).is_err());
    }

    #[test]
    fn test_create_resolves_missing_permissions() {
        let svc = test_service();

        svc.create_role(CreateRole {
            name: "auditor".into(),
            permissions: vec![("read".into(), "report".into())],
        })
        .unwrap();

        // The pair was created on the fly in the directory.
        assert!(svc
            .find_by_action_subject(Some("read"), Some("report"))
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_duplicate_name_conflicts() {
        let svc = test_service();

        svc.create_role(CreateRole { name: "auditor".into(), permissions: vec![] })
            .unwrap();
        let err = svc
            .create_role(CreateRole { name: " auditor ".into(), permissions: vec![] })
            .unwrap_err();
        assert!(matches!(err, AccessError::Conflict(_)));
    }

    #[test]
    fn test_rename() {
        let svc = test_service();

        let auditor = svc
            .create_role(CreateRole { name: "auditor".into(), permissions: vec![] })
            .unwrap();
        svc.create_role(CreateRole { name: "editor".into(), permissions: vec![] })
            .unwrap();

        let err = svc.rename_role(&auditor.id, "editor").unwrap_err();
        assert!(matches!(err, AccessError::Conflict(_)));

        // Renaming to its own name is fine, as is a fresh name.
        svc.rename_role(&auditor.id, "auditor").unwrap();
        let renamed = svc.rename_role(&auditor.id, "inspector").unwrap();
        assert_eq!(renamed.name, "inspector");

        assert!(matches!(
            svc.rename_role("missing", "x"),
            Err(AccessError::NotFound(_)),
        ));
    }

    #[test]
    fn test_add_permissions_is_idempotent() {
        let svc = test_service();

        let role = svc
            .create_role(CreateRole { name: "auditor".into(), permissions: vec![] })
            .unwrap();

        let pairs = vec![("read".to_string(), "report".to_string())];
        svc.add_role_permissions(&role.id, &pairs).unwrap();
        let after_second = svc.add_role_permissions(&role.id, &pairs).unwrap();
        assert_eq!(after_second.permissions.len(), 1);
    }

    #[test]
    fn test_remove_absent_permission_is_noop() {
        let svc = test_service();

        let role = svc
            .create_role(CreateRole {
                name: "auditor".into(),
                permissions: vec![("read".into(), "report".into())],
            })
            .unwrap();

        // Neither an unknown pair, an invalid pair, nor one the role
        // does not hold errors.
        let view = svc
            .remove_role_permissions(
                &role.id,
                &[
                    ("nosuch".to_string(), "pair".to_string()),
                    ("x".to_string(), "y".to_string()),
                    ("read".to_string(), "report".to_string()),
                ],
            )
            .unwrap();
        assert!(view.permissions.is_empty());

        // An empty-permission role is valid long-term state.
        let fetched = svc.get_role(&role.id).unwrap();
        assert!(fetched.permissions.is_empty());
    }

    #[test]
    fn test_find_roles_by_names_drops_unknown() {
        let svc = test_service();

        svc.create_role(CreateRole { name: "auditor".into(), permissions: vec![] })
            .unwrap();
        svc.create_role(CreateRole { name: "editor".into(), permissions: vec![] })
            .unwrap();

        let found = svc
            .find_roles_by_names(&[
                "auditor".to_string(),
                "ghost".to_string(),
                "editor".to_string(),
            ])
            .unwrap();
        let names: Vec<&str> = found.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["auditor", "editor"]);
    }
}
