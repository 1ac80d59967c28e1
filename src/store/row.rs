//! Dynamic value and row types shared by both storage engines

use std::collections::HashMap;

use crate::store::StorageError;

/// A single SQL parameter or result value.
///
/// Covers the four storage classes the schema uses (timestamps are stored
/// as RFC 3339 TEXT, so no dedicated time variant is needed).
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
}

impl From<i64> for SqlValue {
    fn from(v: i64) -> Self {
        SqlValue::Integer(v)
    }
}

impl From<f64> for SqlValue {
    fn from(v: f64) -> Self {
        SqlValue::Real(v)
    }
}

impl From<&str> for SqlValue {
    fn from(v: &str) -> Self {
        SqlValue::Text(v.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(v: String) -> Self {
        SqlValue::Text(v)
    }
}

impl<T> From<Option<T>> for SqlValue
where
    T: Into<SqlValue>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => SqlValue::Null,
        }
    }
}

/// One result row, mapped by column name.
///
/// Column insertion order is not preserved; callers address columns by the
/// names their SELECT list produced.
#[derive(Debug, Clone, Default)]
pub struct Row {
    columns: HashMap<String, SqlValue>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: SqlValue) {
        self.columns.insert(name.into(), value);
    }

    fn lookup(&self, name: &str) -> Result<&SqlValue, StorageError> {
        self.columns
            .get(name)
            .ok_or_else(|| StorageError::MissingColumn(name.to_string()))
    }

    pub fn get_i64(&self, name: &str) -> Result<i64, StorageError> {
        match self.lookup(name)? {
            SqlValue::Integer(v) => Ok(*v),
            other => Err(StorageError::type_mismatch(name, "integer", other)),
        }
    }

    pub fn get_opt_i64(&self, name: &str) -> Result<Option<i64>, StorageError> {
        match self.lookup(name)? {
            SqlValue::Null => Ok(None),
            SqlValue::Integer(v) => Ok(Some(*v)),
            other => Err(StorageError::type_mismatch(name, "integer", other)),
        }
    }

    /// Real-valued column; integer values widen losslessly.
    pub fn get_f64(&self, name: &str) -> Result<f64, StorageError> {
        match self.lookup(name)? {
            SqlValue::Real(v) => Ok(*v),
            SqlValue::Integer(v) => Ok(*v as f64),
            other => Err(StorageError::type_mismatch(name, "real", other)),
        }
    }

    pub fn get_string(&self, name: &str) -> Result<String, StorageError> {
        match self.lookup(name)? {
            SqlValue::Text(v) => Ok(v.clone()),
            other => Err(StorageError::type_mismatch(name, "text", other)),
        }
    }

    pub fn get_opt_string(&self, name: &str) -> Result<Option<String>, StorageError> {
        match self.lookup(name)? {
            SqlValue::Null => Ok(None),
            SqlValue::Text(v) => Ok(Some(v.clone())),
            other => Err(StorageError::type_mismatch(name, "text", other)),
        }
    }
}
