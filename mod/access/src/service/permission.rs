use warden_core::{ListParams, ListResult, new_id, now_rfc3339};
use warden_sql::Value;

use crate::model::{Permission, PermissionPatch};
use crate::service::{AccessError, AccessService};

/// Policy for batch resolution when a pair has no matching permission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnMissing {
    /// Abort the whole batch with a not-found error.
    Fail,
    /// Create the missing permission and include it in the result.
    CreateNew,
    /// Omit the pair from the result. Used for removal, where removing
    /// a nonexistent permission should not error.
    Skip,
}

/// Normalize and validate an `(action, subject)` pair: trimmed,
/// lowercased, at least 3 characters each.
fn normalize_pair(action: &str, subject: &str) -> Result<(String, String), AccessError> {
    let action = action.trim().to_lowercase();
    let subject = subject.trim().to_lowercase();
    if action.chars().count() < 3 {
        return Err(AccessError::Validation(
            "permission action must be at least 3 symbols long".into(),
        ));
    }
    if subject.chars().count() < 3 {
        return Err(AccessError::Validation(
            "permission subject must be at least 3 symbols long".into(),
        ));
    }
    Ok((action, subject))
}

impl AccessService {
    /// Look up a permission by action and/or subject.
    ///
    /// Both filters are optional; an absent filter matches any value
    /// on that field. Returns at most one record — the full pair is
    /// the unique key, so this doubles as a partial existence probe.
    pub fn find_by_action_subject(
        &self,
        action: Option<&str>,
        subject: Option<&str>,
    ) -> Result<Option<Permission>, AccessError> {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        if let Some(action) = action {
            clauses.push(format!("action = ?{}", params.len() + 1));
            params.push(Value::Text(action.trim().to_lowercase()));
        }
        if let Some(subject) = subject {
            clauses.push(format!("subject = ?{}", params.len() + 1));
            params.push(Value::Text(subject.trim().to_lowercase()));
        }

        let where_sql = if clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", clauses.join(" AND "))
        };
        let sql = format!("SELECT data FROM permissions{} LIMIT 1", where_sql);

        let rows = self.sql
            .query(&sql, &params)
            .map_err(|e| AccessError::Storage(e.to_string()))?;
        match rows.first().and_then(|r| r.get_str("data")) {
            Some(data) => serde_json::from_str(data)
                .map(Some)
                .map_err(|e| AccessError::Internal(e.to_string())),
            None => Ok(None),
        }
    }

    /// Create a new permission. Fails with a validation error if the
    /// pair is too short and a conflict if it already exists.
    pub fn create_permission(
        &self,
        action: &str,
        subject: &str,
    ) -> Result<Permission, AccessError> {
        let (action, subject) = normalize_pair(action, subject)?;

        let now = now_rfc3339();
        let permission = Permission {
            id: new_id(),
            action,
            subject,
            created_at: now.clone(),
            updated_at: now.clone(),
        };

        self.insert_record(
            "permissions",
            &permission.id,
            &permission,
            &[
                ("action", Value::Text(permission.action.clone())),
                ("subject", Value::Text(permission.subject.clone())),
                ("created_at", Value::Text(now.clone())),
                ("updated_at", Value::Text(now)),
            ],
        )?;
        Ok(permission)
    }

    /// Find a permission by exact pair, creating it if absent.
    pub fn find_or_create_permission(
        &self,
        action: &str,
        subject: &str,
    ) -> Result<Permission, AccessError> {
        let (action, subject) = normalize_pair(action, subject)?;
        match self.find_by_action_subject(Some(&action), Some(&subject))? {
            Some(existing) => Ok(existing),
            None => self.create_permission(&action, &subject),
        }
    }

    /// Resolve a sequence of `(action, subject)` pairs to full
    /// permission records, applying `on_missing` for pairs with no
    /// match. The output order mirrors the input order (minus skips).
    ///
    /// Under [`OnMissing::Skip`] a pair that fails validation is
    /// treated like any other unresolvable pair and dropped; such a
    /// pair cannot name an existing permission anyway.
    pub fn resolve_permissions(
        &self,
        pairs: &[(String, String)],
        on_missing: OnMissing,
    ) -> Result<Vec<Permission>, AccessError> {
        let mut resolved = Vec::with_capacity(pairs.len());
        for (action, subject) in pairs {
            let (action, subject) = match normalize_pair(action, subject) {
                Ok(pair) => pair,
                Err(_) if on_missing == OnMissing::Skip => continue,
                Err(e) => return Err(e),
            };
            match self.find_by_action_subject(Some(&action), Some(&subject))? {
                Some(permission) => resolved.push(permission),
                None => match on_missing {
                    OnMissing::Fail => {
                        return Err(AccessError::NotFound(format!(
                            "permission ('{}', '{}') not found",
                            action, subject,
                        )));
                    }
                    OnMissing::CreateNew => {
                        resolved.push(self.create_permission(&action, &subject)?);
                    }
                    OnMissing::Skip => {}
                },
            }
        }
        Ok(resolved)
    }

    /// Get a permission by id.
    pub fn get_permission(&self, id: &str) -> Result<Permission, AccessError> {
        self.get_record("permissions", id)
    }

    /// List permissions with pagination.
    pub fn list_permissions(
        &self,
        params: &ListParams,
    ) -> Result<ListResult<Permission>, AccessError> {
        let (items, total) =
            self.list_records("permissions", params.limit, params.skip)?;
        Ok(ListResult { items, total })
    }

    /// Update a permission's pair in place.
    ///
    /// Absent patch fields keep the current value. The resulting pair
    /// is validated like a new one and rejected with a conflict if it
    /// collides with a *different* permission.
    pub fn update_permission(
        &self,
        id: &str,
        patch: &PermissionPatch,
    ) -> Result<Permission, AccessError> {
        let mut current: Permission = self.get_record("permissions", id)?;

        let action = patch.action.as_deref().unwrap_or(&current.action);
        let subject = patch.subject.as_deref().unwrap_or(&current.subject);
        let (action, subject) = normalize_pair(action, subject)?;

        if let Some(duplicate) =
            self.find_by_action_subject(Some(&action), Some(&subject))?
        {
            if duplicate.id != current.id {
                return Err(AccessError::Conflict(format!(
                    "permission ('{}', '{}') already exists",
                    action, subject,
                )));
            }
        }

        let now = now_rfc3339();
        current.action = action;
        current.subject = subject;
        current.updated_at = now.clone();

        self.update_record(
            "permissions",
            id,
            &current,
            &[
                ("action", Value::Text(current.action.clone())),
                ("subject", Value::Text(current.subject.clone())),
                ("updated_at", Value::Text(now)),
            ],
        )?;
        Ok(current)
    }

    /// Delete a permission by exact pair.
    ///
    /// Strips the permission's id from every role that references it
    /// before removing the record itself, so no reader ever observes a
    /// role holding a dangling permission id.
    pub fn delete_permission(
        &self,
        action: &str,
        subject: &str,
    ) -> Result<Permission, AccessError> {
        let (action, subject) = normalize_pair(action, subject)?;
        let permission = self
            .find_by_action_subject(Some(&action), Some(&subject))?
            .ok_or_else(|| {
                AccessError::NotFound(format!(
                    "permission ('{}', '{}') not found",
                    action, subject,
                ))
            })?;

        self.strip_permission_from_roles(&permission.id)?;
        self.delete_record("permissions", &permission.id)?;
        Ok(permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::test_service;

    #[test]
    fn test_create_normalizes_pair() {
        let svc = test_service();

        let perm = svc.create_permission("  Read ", "REPORT").unwrap();
        assert_eq!(perm.action, "read");
        assert_eq!(perm.subject, "report");

        let found = svc
            .find_by_action_subject(Some("read"), Some("report"))
            .unwrap();
        assert_eq!(found.unwrap().id, perm.id);
    }

    #[test]
    fn test_create_validation() {
        let svc = test_service();

        assert!(matches!(
            svc.create_permission("ab", "report"),
            Err(AccessError::Validation(_)),
        ));
        assert!(matches!(
            svc.create_permission("read", "  x "),
            Err(AccessError::Validation(_)),
        ));
    }

    #[test]
    fn test_pair_uniqueness() {
        let svc = test_service();

        svc.create_permission("read", "report").unwrap();
        let err = svc.create_permission("read", "report").unwrap_err();
        assert!(matches!(err, AccessError::Conflict(_)));

        // Same action with a different subject is a distinct permission.
        svc.create_permission("read", "invoice").unwrap();
    }

    #[test]
    fn test_partial_probe() {
        let svc = test_service();
        svc.create_permission("read", "report").unwrap();

        assert!(svc
            .find_by_action_subject(Some("read"), None)
            .unwrap()
            .is_some());
        assert!(svc
            .find_by_action_subject(None, Some("report"))
            .unwrap()
            .is_some());
        assert!(svc
            .find_by_action_subject(Some("write"), None)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_resolve_preserves_order() {
        let svc = test_service();

        // Create the second pair first so creation order and input
        // order disagree.
        svc.create_permission("write", "report").unwrap();

        let pairs = vec![
            ("read".to_string(), "report".to_string()),
            ("write".to_string(), "report".to_string()),
        ];
        let resolved = svc.resolve_permissions(&pairs, OnMissing::CreateNew).unwrap();
        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved[0].action, "read");
        assert_eq!(resolved[1].action, "write");
    }

    #[test]
    fn test_resolve_fail_policy() {
        let svc = test_service();
        svc.create_permission("read", "report").unwrap();

        let pairs = vec![
            ("read".to_string(), "report".to_string()),
            ("write".to_string(), "report".to_string()),
        ];
        let err = svc.resolve_permissions(&pairs, OnMissing::Fail).unwrap_err();
        assert!(matches!(err, AccessError::NotFound(_)));
    }

    #[test]
    fn test_resolve_skip_policy() {
        let svc = test_service();
        svc.create_permission("read", "report").unwrap();

        let pairs = vec![
            ("write".to_string(), "report".to_string()),
            ("read".to_string(), "report".to_string()),
        ];
        let resolved = svc.resolve_permissions(&pairs, OnMissing::Skip).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].action, "read");
    }

    #[test]
    fn test_skip_policy_drops_invalid_pairs() {
        let svc = test_service();
        svc.create_permission("read", "report").unwrap();

        // A sub-3-char pair cannot name an existing permission, so
        // under Skip it is dropped rather than rejected.
        let pairs = vec![
            ("x".to_string(), "y".to_string()),
            ("read".to_string(), "report".to_string()),
        ];
        let resolved = svc.resolve_permissions(&pairs, OnMissing::Skip).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].action, "read");

        // The other policies still validate.
        assert!(matches!(
            svc.resolve_permissions(&pairs, OnMissing::Fail),
            Err(AccessError::Validation(_)),
        ));
        assert!(matches!(
            svc.resolve_permissions(&pairs, OnMissing::CreateNew),
            Err(AccessError::Validation(_)),
        ));
    }

    #[test]
    fn test_list_pagination() {
        let svc = test_service();
        for subject in ["alpha", "beta", "gamma"] {
            svc.create_permission("read", subject).unwrap();
        }

        let all = svc.list_permissions(&ListParams::default()).unwrap();
        assert_eq!(all.total, 3);
        assert_eq!(all.items.len(), 3);

        let page = svc
            .list_permissions(&ListParams { limit: 2, skip: 2 })
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 1);
    }

    #[test]
    fn test_update_rejects_collision_with_other() {
        let svc = test_service();
        svc.create_permission("read", "report").unwrap();
        let target = svc.create_permission("write", "report").unwrap();

        let err = svc
            .update_permission(
                &target.id,
                &PermissionPatch {
                    action: Some("read".into()),
                    subject: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, AccessError::Conflict(_)));

        // A self-collision (no effective change) is not a conflict.
        let same = svc
            .update_permission(
                &target.id,
                &PermissionPatch {
                    action: Some("write".into()),
                    subject: None,
                },
            )
            .unwrap();
        assert_eq!(same.action, "write");
    }

    #[test]
    fn test_delete_unknown_pair() {
        let svc = test_service();
        let err = svc.delete_permission("read", "report").unwrap_err();
        assert!(matches!(err, AccessError::NotFound(_)));
    }
}
