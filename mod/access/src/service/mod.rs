pub mod cascade;
pub mod expansion;
pub mod permission;
pub mod role;
pub mod schema;
pub mod session;
pub mod user;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use warden_sql::{SqlStore, Value};

/// Access service error type.
#[derive(Debug, Error)]
pub enum AccessError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation: {0}")]
    Validation(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl From<AccessError> for warden_core::ServiceError {
    fn from(e: AccessError) -> Self {
        match e {
            AccessError::NotFound(m) => warden_core::ServiceError::NotFound(m),
            AccessError::Conflict(m) => warden_core::ServiceError::Conflict(m),
            AccessError::Validation(m) => warden_core::ServiceError::Validation(m),
            AccessError::Unauthorized(m) => warden_core::ServiceError::Unauthorized(m),
            AccessError::Storage(m) => warden_core::ServiceError::Storage(m),
            AccessError::Internal(m) => warden_core::ServiceError::Internal(m),
        }
    }
}

/// Classify a storage error: uniqueness violations become conflicts so
/// the storage layer backs up the application-level pre-checks.
fn storage_err(e: warden_sql::SqlError) -> AccessError {
    if e.is_unique_violation() {
        AccessError::Conflict(e.to_string())
    } else {
        AccessError::Storage(e.to_string())
    }
}

/// Configuration for the access service.
#[derive(Debug, Clone)]
pub struct AccessConfig {
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Token lifetime in seconds (default: 24h).
    pub token_ttl: i64,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "warden-dev-secret-change-me".to_string(),
            token_ttl: 86400, // 24h
        }
    }
}

/// The access service. Holds the storage backend and configuration.
pub struct AccessService {
    pub(crate) sql: Arc<dyn SqlStore>,
    pub(crate) config: AccessConfig,
}

impl AccessService {
    /// Create a new AccessService, initializing the DB schema.
    pub fn new(
        sql: Arc<dyn SqlStore>,
        config: AccessConfig,
    ) -> Result<Arc<Self>, AccessError> {
        schema::init_schema(sql.as_ref())?;
        Ok(Arc::new(Self { sql, config }))
    }

    // ── Generic CRUD helpers ──

    /// Insert a record as JSON into a table with indexed columns.
    pub(crate) fn insert_record<T: Serialize>(
        &self,
        table: &str,
        id: &str,
        record: &T,
        indexes: &[(&str, Value)],
    ) -> Result<(), AccessError> {
        let json = serde_json::to_string(record)
            .map_err(|e| AccessError::Internal(e.to_string()))?;

        let mut cols = vec!["id", "data"];
        let mut placeholders = vec!["?1".to_string(), "?2".to_string()];
        let mut params = vec![Value::Text(id.to_string()), Value::Text(json)];

        for (i, (col, val)) in indexes.iter().enumerate() {
            let idx = i + 3;
            cols.push(col);
            placeholders.push(format!("?{}", idx));
            params.push(val.clone());
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            cols.join(", "),
            placeholders.join(", "),
        );

        self.sql.exec(&sql, &params).map_err(storage_err)?;
        Ok(())
    }

    /// Get a record by id, deserializing the JSON `data` column.
    pub(crate) fn get_record<T: DeserializeOwned>(
        &self,
        table: &str,
        id: &str,
    ) -> Result<T, AccessError> {
        let sql = format!("SELECT data FROM {} WHERE id = ?1", table);
        let rows = self.sql
            .query(&sql, &[Value::Text(id.to_string())])
            .map_err(storage_err)?;
        let row = rows
            .first()
            .ok_or_else(|| AccessError::NotFound(format!("{}/{}", table, id)))?;
        let data = row
            .get_str("data")
            .ok_or_else(|| AccessError::Internal("missing data column".into()))?;
        serde_json::from_str(data).map_err(|e| AccessError::Internal(e.to_string()))
    }

    /// Update a record's JSON data and indexed columns.
    pub(crate) fn update_record<T: Serialize>(
        &self,
        table: &str,
        id: &str,
        record: &T,
        indexes: &[(&str, Value)],
    ) -> Result<(), AccessError> {
        let json = serde_json::to_string(record)
            .map_err(|e| AccessError::Internal(e.to_string()))?;

        let mut sets = vec!["data = ?1".to_string()];
        let mut params: Vec<Value> = vec![Value::Text(json)];

        for (i, (col, val)) in indexes.iter().enumerate() {
            let idx = i + 2;
            sets.push(format!("{} = ?{}", col, idx));
            params.push(val.clone());
        }

        let id_idx = params.len() + 1;
        params.push(Value::Text(id.to_string()));

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            table,
            sets.join(", "),
            id_idx,
        );

        let affected = self.sql.exec(&sql, &params).map_err(storage_err)?;
        if affected == 0 {
            return Err(AccessError::NotFound(format!("{}/{}", table, id)));
        }

        Ok(())
    }

    /// Delete a record by id.
    pub(crate) fn delete_record(&self, table: &str, id: &str) -> Result<(), AccessError> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", table);
        let affected = self.sql
            .exec(&sql, &[Value::Text(id.to_string())])
            .map_err(storage_err)?;
        if affected == 0 {
            return Err(AccessError::NotFound(format!("{}/{}", table, id)));
        }
        Ok(())
    }

    /// List records with pagination. `limit == 0` means no limit.
    pub(crate) fn list_records<T: DeserializeOwned>(
        &self,
        table: &str,
        limit: usize,
        skip: usize,
    ) -> Result<(Vec<T>, usize), AccessError> {
        let count_sql = format!("SELECT COUNT(*) as cnt FROM {}", table);
        let count_rows = self.sql
            .query(&count_sql, &[])
            .map_err(storage_err)?;
        let total = count_rows
            .first()
            .and_then(|r| r.get_i64("cnt"))
            .unwrap_or(0) as usize;

        // SQLite treats a negative LIMIT as unbounded.
        let limit = if limit == 0 { -1 } else { limit as i64 };

        let sql = format!(
            "SELECT data FROM {} ORDER BY created_at, id LIMIT ?1 OFFSET ?2",
            table,
        );
        let rows = self.sql
            .query(&sql, &[Value::Integer(limit), Value::Integer(skip as i64)])
            .map_err(storage_err)?;

        let mut items = Vec::new();
        for row in &rows {
            let data = row
                .get_str("data")
                .ok_or_else(|| AccessError::Internal("missing data column".into()))?;
            let item: T =
                serde_json::from_str(data).map_err(|e| AccessError::Internal(e.to_string()))?;
            items.push(item);
        }

        Ok((items, total))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use warden_sql::SqliteStore;

    use super::{AccessConfig, AccessService};

    pub fn test_service() -> Arc<AccessService> {
        let sql = Arc::new(SqliteStore::open_in_memory().unwrap());
        AccessService::new(sql, AccessConfig::default()).unwrap()
    }
}
