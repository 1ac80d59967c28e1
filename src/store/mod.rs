//! Storage adapter - one query interface over two interchangeable engines
//!
//! Every statement in the system is written once, with `?` positional
//! placeholders, and executed through [`Store::execute`]. The embedded
//! SQLite engine runs the template as-is; the networked PostgreSQL engine
//! rewrites placeholders to its `$1, $2, ...` syntax before dispatch. Each
//! engine's "rows affected" and "generated primary key" reporting is
//! normalized into one [`QueryResult`] shape.
//!
//! This module is the only place that knows which engine is active. The
//! two dialect differences the rest of the system needs (auto-increment
//! primary key DDL and the generated-id clause on INSERT) are exposed as
//! opaque fragments rather than a backend flag.

mod postgres;
mod row;
mod sqlite;

pub use postgres::PostgresBackend;
pub use row::{Row, SqlValue};
pub use sqlite::SqliteBackend;

use std::sync::Mutex;

use thiserror::Error;

/// Errors surfaced by the storage layer.
///
/// Engine failures pass the original driver message through unmodified;
/// the adapter performs no retries.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{0}")]
    Backend(String),

    #[error("column '{0}' missing from result row")]
    MissingColumn(String),

    #[error("column '{column}' is not {wanted} (got {got})")]
    TypeMismatch {
        column: String,
        wanted: &'static str,
        got: &'static str,
    },

    #[error("storage connection poisoned by a panicked thread")]
    Poisoned,
}

impl StorageError {
    pub(crate) fn type_mismatch(column: &str, wanted: &'static str, got: &SqlValue) -> Self {
        let got = match got {
            SqlValue::Null => "null",
            SqlValue::Integer(_) => "integer",
            SqlValue::Real(_) => "real",
            SqlValue::Text(_) => "text",
        };
        StorageError::TypeMismatch {
            column: column.to_string(),
            wanted,
            got,
        }
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

impl From<::postgres::Error> for StorageError {
    fn from(err: ::postgres::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

/// Normalized result of one statement execution.
#[derive(Debug, Default)]
pub struct QueryResult {
    /// All result rows for reads (and RETURNING writes); empty otherwise.
    pub rows: Vec<Row>,

    /// Row count for reads; rows touched for writes.
    pub affected: u64,

    /// Generated primary key for inserts, when the engine reported one.
    pub inserted_id: Option<i64>,
}

/// One storage engine behind the adapter.
pub trait Backend: Send {
    /// Engine name for the selection log and diagnostics.
    fn name(&self) -> &'static str;

    /// Run one statement template with positional `?` parameters.
    fn execute(&mut self, template: &str, params: &[SqlValue])
        -> Result<QueryResult, StorageError>;

    /// DDL fragment declaring an auto-increment integer primary key.
    fn auto_primary_key(&self) -> &'static str;

    /// Clause appended to an INSERT when the generated id is needed.
    ///
    /// Empty for engines that report the last auto-increment value out of
    /// band (SQLite); ` RETURNING id` for engines that only report it via
    /// a returned row (PostgreSQL).
    fn returning_id(&self) -> &'static str;
}

/// The adapter instance handed to every component that needs storage.
///
/// Constructed once at process start; there is no ambient/global handle.
pub struct Store {
    backend: Mutex<Box<dyn Backend>>,
    name: &'static str,
    auto_primary_key: &'static str,
    returning_id: &'static str,
}

impl Store {
    pub fn new(backend: Box<dyn Backend>) -> Self {
        let name = backend.name();
        let auto_primary_key = backend.auto_primary_key();
        let returning_id = backend.returning_id();
        Self {
            backend: Mutex::new(backend),
            name,
            auto_primary_key,
            returning_id,
        }
    }

    /// Execute one statement template against the active engine.
    pub fn execute(
        &self,
        template: &str,
        params: &[SqlValue],
    ) -> Result<QueryResult, StorageError> {
        let mut backend = self.backend.lock().map_err(|_| StorageError::Poisoned)?;
        backend.execute(template, params)
    }

    pub fn backend_name(&self) -> &'static str {
        self.name
    }

    pub fn auto_primary_key(&self) -> &'static str {
        self.auto_primary_key
    }

    pub fn returning_id(&self) -> &'static str {
        self.returning_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_store() -> Store {
        Store::new(Box::new(SqliteBackend::open_in_memory().unwrap()))
    }

    #[test]
    fn test_read_rows_and_count() {
        let store = memory_store();
        store
            .execute(
                "CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT)",
                &[],
            )
            .unwrap();
        store
            .execute("INSERT INTO t (name) VALUES (?)", &["alpha".into()])
            .unwrap();
        store
            .execute("INSERT INTO t (name) VALUES (?)", &["beta".into()])
            .unwrap();

        let result = store
            .execute("SELECT id, name FROM t ORDER BY id", &[])
            .unwrap();
        assert_eq!(result.affected, 2);
        assert_eq!(result.rows.len(), 2);
        assert_eq!(result.inserted_id, None);
        assert_eq!(result.rows[0].get_string("name").unwrap(), "alpha");
    }

    #[test]
    fn test_insert_reports_generated_id() {
        let store = memory_store();
        store
            .execute(
                &format!("CREATE TABLE t (id {}, name TEXT)", store.auto_primary_key()),
                &[],
            )
            .unwrap();

        let first = store
            .execute("INSERT INTO t (name) VALUES (?)", &["one".into()])
            .unwrap();
        let second = store
            .execute("INSERT INTO t (name) VALUES (?)", &["two".into()])
            .unwrap();
        assert_eq!(first.inserted_id, Some(1));
        assert_eq!(second.inserted_id, Some(2));
        assert_eq!(second.affected, 1);
    }

    #[test]
    fn test_update_reports_affected_not_inserted() {
        let store = memory_store();
        store
            .execute(
                &format!("CREATE TABLE t (id {}, name TEXT)", store.auto_primary_key()),
                &[],
            )
            .unwrap();
        store
            .execute("INSERT INTO t (name) VALUES (?)", &["one".into()])
            .unwrap();

        let updated = store
            .execute(
                "UPDATE t SET name = ? WHERE id = ?",
                &["renamed".into(), 1i64.into()],
            )
            .unwrap();
        assert_eq!(updated.affected, 1);
        assert_eq!(updated.inserted_id, None);

        let missed = store
            .execute(
                "UPDATE t SET name = ? WHERE id = ?",
                &["nobody".into(), 99i64.into()],
            )
            .unwrap();
        assert_eq!(missed.affected, 0);
    }

    #[test]
    fn test_backend_error_carries_engine_message() {
        let store = memory_store();
        let err = store
            .execute("SELECT * FROM missing_table", &[])
            .unwrap_err();
        match err {
            StorageError::Backend(msg) => assert!(msg.contains("missing_table")),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
