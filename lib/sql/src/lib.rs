//! Generic SQL persistence seam.
//!
//! Services depend on the [`SqlStore`] trait, never on a concrete
//! database. The only shipped implementation is [`SqliteStore`]
//! (embedded, bundled SQLite), which is also what tests use via
//! `SqliteStore::open_in_memory()`.

pub mod sqlite;

use thiserror::Error;

pub use sqlite::SqliteStore;

/// SQL layer error type.
#[derive(Error, Debug)]
pub enum SqlError {
    #[error("query error: {0}")]
    Query(String),

    #[error("execution error: {0}")]
    Execution(String),

    #[error("connection error: {0}")]
    Connection(String),
}

impl SqlError {
    /// Whether this error was caused by a UNIQUE constraint violation.
    ///
    /// Callers use this to turn storage-level uniqueness enforcement
    /// into a conflict error instead of an internal one.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            SqlError::Execution(msg) | SqlError::Query(msg) => {
                msg.contains("UNIQUE constraint")
            }
            SqlError::Connection(_) => false,
        }
    }
}

/// A dynamically-typed SQL parameter value.
#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

/// A row returned from a SQL query — column name to value.
#[derive(Debug, Clone)]
pub struct Row {
    pub columns: Vec<(String, Value)>,
}

impl Row {
    /// Get a column value by name.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Get a text column value by name.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        match self.get(name) {
            Some(Value::Text(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Get an integer column value by name.
    pub fn get_i64(&self, name: &str) -> Option<i64> {
        match self.get(name) {
            Some(Value::Integer(i)) => Some(*i),
            _ => None,
        }
    }
}

/// SqlStore provides a SQL execution interface backed by an embedded
/// database.
pub trait SqlStore: Send + Sync {
    /// Execute a query and return rows.
    fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>, SqlError>;

    /// Execute a statement (INSERT/UPDATE/DELETE) and return the
    /// affected row count.
    fn exec(&self, sql: &str, params: &[Value]) -> Result<u64, SqlError>;
}
