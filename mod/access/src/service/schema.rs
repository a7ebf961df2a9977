use warden_sql::SqlStore;

use crate::service::AccessError;

/// Initialize the SQLite schema for all access resources.
///
/// Reference sets (role -> permissions, user -> roles) live in join
/// tables rather than inside the record JSON: cascades are then single
/// bulk deletes and uniqueness is enforced by the storage layer.
/// Insertion order of a set is the join-table rowid order.
pub fn init_schema(sql: &dyn SqlStore) -> Result<(), AccessError> {
    let statements = [
        // Permissions: unique (action, subject) pair
        "CREATE TABLE IF NOT EXISTS permissions (
            id TEXT PRIMARY KEY,
            action TEXT NOT NULL,
            subject TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (action, subject)
        )",
        "CREATE INDEX IF NOT EXISTS idx_permissions_action ON permissions(action)",
        "CREATE INDEX IF NOT EXISTS idx_permissions_subject ON permissions(subject)",

        // Roles: unique name
        "CREATE TABLE IF NOT EXISTS roles (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",

        // Role -> permission references
        "CREATE TABLE IF NOT EXISTS role_permissions (
            role_id TEXT NOT NULL,
            permission_id TEXT NOT NULL,
            added_at TEXT NOT NULL,
            PRIMARY KEY (role_id, permission_id),
            FOREIGN KEY (role_id) REFERENCES roles(id),
            FOREIGN KEY (permission_id) REFERENCES permissions(id)
        )",
        "CREATE INDEX IF NOT EXISTS idx_role_permissions_permission
            ON role_permissions(permission_id)",

        // Users: unique email and user_name
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            user_name TEXT NOT NULL UNIQUE,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",

        // User -> role references
        "CREATE TABLE IF NOT EXISTS user_roles (
            user_id TEXT NOT NULL,
            role_id TEXT NOT NULL,
            added_at TEXT NOT NULL,
            PRIMARY KEY (user_id, role_id),
            FOREIGN KEY (user_id) REFERENCES users(id),
            FOREIGN KEY (role_id) REFERENCES roles(id)
        )",
        "CREATE INDEX IF NOT EXISTS idx_user_roles_role ON user_roles(role_id)",
    ];

    for stmt in &statements {
        sql.exec(stmt, &[])
            .map_err(|e| AccessError::Storage(e.to_string()))?;
    }

    Ok(())
}
