//! Embedded SQLite engine

use std::path::Path;

use rusqlite::types::ValueRef;
use rusqlite::Connection;

use crate::store::{Backend, QueryResult, Row, SqlValue, StorageError};

/// File-backed (or in-memory) SQLite engine.
pub struct SqliteBackend {
    conn: Connection,
}

impl SqliteBackend {
    /// Open or create the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| StorageError::Backend(e.to_string()))?;
            }
        }
        let conn = Connection::open(path)?;
        Self::configure(&conn)?;
        Ok(Self { conn })
    }

    /// Ephemeral in-memory database; used by tests and dry runs.
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        Self::configure(&conn)?;
        Ok(Self { conn })
    }

    fn configure(conn: &Connection) -> Result<(), StorageError> {
        // WAL keeps concurrent readers off the writer's back.
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        Ok(())
    }
}

impl rusqlite::ToSql for SqlValue {
    fn to_sql(&self) -> rusqlite::Result<rusqlite::types::ToSqlOutput<'_>> {
        use rusqlite::types::{ToSqlOutput, Value};
        let value = match self {
            SqlValue::Null => Value::Null,
            SqlValue::Integer(v) => Value::Integer(*v),
            SqlValue::Real(v) => Value::Real(*v),
            SqlValue::Text(v) => Value::Text(v.clone()),
        };
        Ok(ToSqlOutput::Owned(value))
    }
}

fn is_select(template: &str) -> bool {
    template
        .trim_start()
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("SELECT"))
}

fn is_insert(template: &str) -> bool {
    template
        .trim_start()
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("INSERT"))
}

impl Backend for SqliteBackend {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn execute(
        &mut self,
        template: &str,
        params: &[SqlValue],
    ) -> Result<QueryResult, StorageError> {
        if is_select(template) {
            let mut stmt = self.conn.prepare(template)?;
            let names: Vec<String> = stmt
                .column_names()
                .into_iter()
                .map(|n| n.to_string())
                .collect();

            let mut rows = Vec::new();
            let mut raw = stmt.query(rusqlite::params_from_iter(params.iter()))?;
            while let Some(source) = raw.next()? {
                let mut row = Row::new();
                for (idx, name) in names.iter().enumerate() {
                    let value = match source.get_ref(idx)? {
                        ValueRef::Null => SqlValue::Null,
                        ValueRef::Integer(v) => SqlValue::Integer(v),
                        ValueRef::Real(v) => SqlValue::Real(v),
                        ValueRef::Text(bytes) => {
                            SqlValue::Text(String::from_utf8_lossy(bytes).into_owned())
                        }
                        ValueRef::Blob(_) => {
                            return Err(StorageError::Backend(format!(
                                "unsupported blob column '{name}'"
                            )))
                        }
                    };
                    row.insert(name.clone(), value);
                }
                rows.push(row);
            }

            let affected = rows.len() as u64;
            Ok(QueryResult {
                rows,
                affected,
                inserted_id: None,
            })
        } else {
            let affected = self
                .conn
                .execute(template, rusqlite::params_from_iter(params.iter()))?
                as u64;
            // last_insert_rowid() is only meaningful right after an INSERT.
            let inserted_id = if is_insert(template) {
                Some(self.conn.last_insert_rowid())
            } else {
                None
            };
            Ok(QueryResult {
                rows: Vec::new(),
                affected,
                inserted_id,
            })
        }
    }

    fn auto_primary_key(&self) -> &'static str {
        "INTEGER PRIMARY KEY AUTOINCREMENT"
    }

    fn returning_id(&self) -> &'static str {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statement_kind_detection() {
        assert!(is_select("SELECT 1"));
        assert!(is_select("  select id FROM t"));
        assert!(!is_select("INSERT INTO t VALUES (1)"));
        assert!(is_insert("\n insert into t VALUES (1)"));
        assert!(!is_insert("UPDATE t SET a = 1"));
        assert!(!is_select(""));
    }

    #[test]
    fn test_null_roundtrip() {
        let mut backend = SqliteBackend::open_in_memory().unwrap();
        backend
            .execute(
                "CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT, note TEXT)",
                &[],
            )
            .unwrap();
        backend
            .execute("INSERT INTO t (note) VALUES (?)", &[SqlValue::Null])
            .unwrap();

        let result = backend.execute("SELECT note FROM t", &[]).unwrap();
        assert_eq!(result.rows[0].get_opt_string("note").unwrap(), None);
    }
}
