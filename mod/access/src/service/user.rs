use warden_core::{ListParams, ListResult, merge_patch, new_id, now_rfc3339};
use warden_sql::Value;

use crate::model::{AuthPayload, SignUp, User, UserView};
use crate::service::session::{hash_password, verify_password};
use crate::service::{AccessError, AccessService};

/// Fields a PATCH may touch. `roles` is deliberately absent: role
/// membership changes only through the dedicated add/remove
/// operations, so the two mutation paths never race on the same set.
const PATCHABLE_FIELDS: &[&str] = &["email", "userName", "firstName", "lastName", "password"];

/// Password complexity policy: at least 6 characters with one
/// lowercase letter, one uppercase letter and one digit.
fn check_password_policy(password: &str) -> Result<(), AccessError> {
    let long_enough = password.chars().count() >= 6;
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if long_enough && has_lower && has_upper && has_digit {
        Ok(())
    } else {
        Err(AccessError::Validation(
            "password must be at least 6 characters with a lowercase letter, \
             an uppercase letter and a digit"
                .into(),
        ))
    }
}

/// Minimal email syntax check: one `@`, a non-empty local part, and a
/// dotted domain without whitespace.
fn check_email_syntax(email: &str) -> Result<(), AccessError> {
    let invalid = || AccessError::Validation(format!("'{}' is not a valid email", email));

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.is_empty()
        || domain.contains('@')
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
        || email.chars().any(char::is_whitespace)
    {
        return Err(invalid());
    }
    Ok(())
}

impl AccessService {
    /// Register a new account.
    ///
    /// Validates every field, hashes the password and returns an
    /// authentication payload. The raw password is neither stored nor
    /// logged, and the hash never leaves the service.
    pub fn sign_up(&self, input: SignUp) -> Result<AuthPayload, AccessError> {
        let email = input.email.trim().to_lowercase();
        let user_name = input.user_name.trim().to_string();
        let first_name = input.first_name.trim().to_string();
        let last_name = input.last_name.trim().to_string();

        check_email_syntax(&email)?;
        if user_name.is_empty() {
            return Err(AccessError::Validation("user name is required".into()));
        }
        if first_name.is_empty() {
            return Err(AccessError::Validation("first name is required".into()));
        }
        if last_name.is_empty() {
            return Err(AccessError::Validation("last name is required".into()));
        }
        check_password_policy(&input.password)?;

        // Pre-check for a friendlier message; the UNIQUE constraints
        // are the real guarantee under concurrency.
        if self.find_user_by_email(&email)?.is_some() {
            return Err(AccessError::Conflict("email already registered".into()));
        }
        if self.find_user_by_user_name(&user_name)?.is_some() {
            return Err(AccessError::Conflict("user name already taken".into()));
        }

        let now = now_rfc3339();
        let user = User {
            id: new_id(),
            email,
            user_name,
            first_name,
            last_name,
            password_hash: hash_password(&input.password)?,
            created_at: now.clone(),
            updated_at: now.clone(),
        };

        self.insert_record(
            "users",
            &user.id,
            &user,
            &[
                ("email", Value::Text(user.email.clone())),
                ("user_name", Value::Text(user.user_name.clone())),
                ("created_at", Value::Text(now.clone())),
                ("updated_at", Value::Text(now)),
            ],
        )?;

        tracing::info!(user_id = %user.id, user_name = %user.user_name, "user signed up");

        Ok(AuthPayload {
            token: self.issue_token(&user.id)?,
            user: self.expand_user(&user)?,
        })
    }

    /// Get a user by id with roles and their nested permissions
    /// expanded.
    pub fn get_user(&self, id: &str) -> Result<UserView, AccessError> {
        let user: User = self.get_record("users", id)?;
        self.expand_user(&user)
    }

    /// List users with pagination, roles expanded.
    pub fn list_users(&self, params: &ListParams) -> Result<ListResult<UserView>, AccessError> {
        let (items, total): (Vec<User>, usize) =
            self.list_records("users", params.limit, params.skip)?;
        let mut views = Vec::with_capacity(items.len());
        for user in &items {
            views.push(self.expand_user(user)?);
        }
        Ok(ListResult { items: views, total })
    }

    /// Apply a partial update to a user.
    ///
    /// Only `email`, `userName`, `firstName`, `lastName` and
    /// `password` may be patched; any other key — `roles` in
    /// particular — is rejected.
    pub fn update_user(
        &self,
        id: &str,
        patch: &serde_json::Value,
    ) -> Result<UserView, AccessError> {
        let user: User = self.get_record("users", id)?;

        let patch_obj = patch
            .as_object()
            .ok_or_else(|| AccessError::Validation("patch must be a JSON object".into()))?;
        for key in patch_obj.keys() {
            if key == "roles" {
                return Err(AccessError::Validation(
                    "roles cannot be updated through this endpoint; \
                     use add-roles / remove-roles"
                        .into(),
                ));
            }
            if !PATCHABLE_FIELDS.contains(&key.as_str()) {
                return Err(AccessError::Validation(format!(
                    "field '{}' cannot be updated",
                    key,
                )));
            }
        }

        let patch_str = |key: &str| -> Result<Option<String>, AccessError> {
            match patch_obj.get(key) {
                None => Ok(None),
                Some(serde_json::Value::String(s)) => Ok(Some(s.clone())),
                Some(_) => Err(AccessError::Validation(format!(
                    "field '{}' must be a string",
                    key,
                ))),
            }
        };

        // Normalize and validate each supplied field before merging.
        let mut normalized = serde_json::Map::new();
        if let Some(email) = patch_str("email")? {
            let email = email.trim().to_lowercase();
            check_email_syntax(&email)?;
            if let Some(existing) = self.find_user_by_email(&email)? {
                if existing.id != user.id {
                    return Err(AccessError::Conflict("email already registered".into()));
                }
            }
            normalized.insert("email".into(), email.into());
        }
        if let Some(user_name) = patch_str("userName")? {
            let user_name = user_name.trim().to_string();
            if user_name.is_empty() {
                return Err(AccessError::Validation("user name is required".into()));
            }
            if let Some(existing) = self.find_user_by_user_name(&user_name)? {
                if existing.id != user.id {
                    return Err(AccessError::Conflict("user name already taken".into()));
                }
            }
            normalized.insert("userName".into(), user_name.into());
        }
        if let Some(first_name) = patch_str("firstName")? {
            let first_name = first_name.trim().to_string();
            if first_name.is_empty() {
                return Err(AccessError::Validation("first name is required".into()));
            }
            normalized.insert("firstName".into(), first_name.into());
        }
        if let Some(last_name) = patch_str("lastName")? {
            let last_name = last_name.trim().to_string();
            if last_name.is_empty() {
                return Err(AccessError::Validation("last name is required".into()));
            }
            normalized.insert("lastName".into(), last_name.into());
        }
        if let Some(password) = patch_str("password")? {
            check_password_policy(&password)?;
            normalized.insert("passwordHash".into(), hash_password(&password)?.into());
        }

        let now = now_rfc3339();
        normalized.insert("updatedAt".into(), now.clone().into());

        let mut base = serde_json::to_value(&user)
            .map_err(|e| AccessError::Internal(e.to_string()))?;
        merge_patch(&mut base, &serde_json::Value::Object(normalized));
        let user: User = serde_json::from_value(base)
            .map_err(|e| AccessError::Internal(e.to_string()))?;

        self.update_record(
            "users",
            id,
            &user,
            &[
                ("email", Value::Text(user.email.clone())),
                ("user_name", Value::Text(user.user_name.clone())),
                ("updated_at", Value::Text(now)),
            ],
        )?;
        self.expand_user(&user)
    }

    /// Attach roles to a user by role name, set-union semantics.
    /// Unknown names are silently dropped.
    pub fn add_user_roles(
        &self,
        id: &str,
        role_names: &[String],
    ) -> Result<UserView, AccessError> {
        let user: User = self.get_record("users", id)?;
        let roles = self.find_roles_by_names(role_names)?;

        let now = now_rfc3339();
        for role in &roles {
            self.sql
                .exec(
                    "INSERT OR IGNORE INTO user_roles (user_id, role_id, added_at)
                     VALUES (?1, ?2, ?3)",
                    &[
                        Value::Text(user.id.clone()),
                        Value::Text(role.id.clone()),
                        Value::Text(now.clone()),
                    ],
                )
                .map_err(|e| AccessError::Storage(e.to_string()))?;
        }
        self.expand_user(&user)
    }

    /// Detach roles from a user by role name. Unknown names and roles
    /// the user does not hold are no-ops.
    pub fn remove_user_roles(
        &self,
        id: &str,
        role_names: &[String],
    ) -> Result<UserView, AccessError> {
        let user: User = self.get_record("users", id)?;
        let roles = self.find_roles_by_names(role_names)?;

        for role in &roles {
            self.sql
                .exec(
                    "DELETE FROM user_roles WHERE user_id = ?1 AND role_id = ?2",
                    &[Value::Text(user.id.clone()), Value::Text(role.id.clone())],
                )
                .map_err(|e| AccessError::Storage(e.to_string()))?;
        }
        self.expand_user(&user)
    }

    /// Delete a user by id. No cascade beyond the user's own role
    /// references — roles and permissions outlive their holders.
    pub fn delete_user(&self, id: &str) -> Result<User, AccessError> {
        let user: User = self.get_record("users", id)?;

        self.sql
            .exec(
                "DELETE FROM user_roles WHERE user_id = ?1",
                &[Value::Text(user.id.clone())],
            )
            .map_err(|e| AccessError::Storage(e.to_string()))?;

        self.delete_record("users", &user.id)?;
        Ok(user)
    }

    /// Authenticate by email or user name plus password.
    ///
    /// The identifier is treated as an email iff it contains `@`.
    /// Unknown account and wrong password produce the same error kind,
    /// so callers cannot probe for account existence.
    pub fn authenticate(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<AuthPayload, AccessError> {
        let user = if identifier.contains('@') {
            self.find_user_by_email(&identifier.trim().to_lowercase())?
        } else {
            self.find_user_by_user_name(identifier.trim())?
        };

        let user = user.ok_or_else(|| AccessError::Unauthorized("user not found".into()))?;
        if !verify_password(password, &user.password_hash) {
            return Err(AccessError::Unauthorized("password is wrong".into()));
        }

        Ok(AuthPayload {
            token: self.issue_token(&user.id)?,
            user: self.expand_user(&user)?,
        })
    }

    pub(crate) fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AccessError> {
        self.find_user_by_column("email", email)
    }

    pub(crate) fn find_user_by_user_name(
        &self,
        user_name: &str,
    ) -> Result<Option<User>, AccessError> {
        self.find_user_by_column("user_name", user_name)
    }

    fn find_user_by_column(&self, column: &str, value: &str) -> Result<Option<User>, AccessError> {
        let sql = format!("SELECT data FROM users WHERE {} = ?1", column);
        let rows = self.sql
            .query(&sql, &[Value::Text(value.to_string())])
            .map_err(|e| AccessError::Storage(e.to_string()))?;
        match rows.first().and_then(|r| r.get_str("data")) {
            Some(data) => serde_json::from_str(data)
                .map(Some)
                .map_err(|e| AccessError::Internal(e.to_string())),
            None => Ok(None),
        }
    }
}
