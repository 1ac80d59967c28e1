//! Networked PostgreSQL engine
//!
//! Statement templates arrive with the adapter's `?` placeholder syntax and
//! are rewritten to PostgreSQL's `$1, $2, ...` positional syntax before
//! dispatch. Generated primary keys come back through a `RETURNING id`
//! clause, which callers append via the adapter's `returning_id()` fragment.

use bytes::BytesMut;
use postgres::types::{to_sql_checked, IsNull, ToSql, Type};
use postgres::{Client, NoTls};

use crate::store::{Backend, QueryResult, Row, SqlValue, StorageError};

pub struct PostgresBackend {
    client: Client,
}

impl PostgresBackend {
    /// Connect to the server named by a `postgres://` URL.
    pub fn connect(url: &str) -> Result<Self, StorageError> {
        let client = Client::connect(url, NoTls)?;
        Ok(Self { client })
    }
}

/// Rewrite each `?` placeholder to `$1`, `$2`, ... in left-to-right order.
///
/// Question marks inside single-quoted string literals are left alone; a
/// doubled `''` escape toggles the in-string flag twice and nets out.
fn translate_placeholders(template: &str) -> String {
    let mut out = String::with_capacity(template.len() + 8);
    let mut index = 0u32;
    let mut in_string = false;
    for ch in template.chars() {
        match ch {
            '\'' => {
                in_string = !in_string;
                out.push(ch);
            }
            '?' if !in_string => {
                index += 1;
                out.push('$');
                out.push_str(&index.to_string());
            }
            _ => out.push(ch),
        }
    }
    out
}

impl ToSql for SqlValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            SqlValue::Null => Ok(IsNull::Yes),
            SqlValue::Integer(v) => v.to_sql(ty, out),
            SqlValue::Real(v) => v.to_sql(ty, out),
            SqlValue::Text(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(ty: &Type) -> bool {
        <i64 as ToSql>::accepts(ty)
            || <f64 as ToSql>::accepts(ty)
            || <&str as ToSql>::accepts(ty)
    }

    to_sql_checked!();
}

fn map_row(source: &postgres::Row) -> Result<Row, StorageError> {
    let mut row = Row::new();
    for (idx, column) in source.columns().iter().enumerate() {
        let name = column.name();
        let ty = column.type_();
        let value = if *ty == Type::INT8 {
            source.try_get::<_, Option<i64>>(idx)?.into()
        } else if *ty == Type::INT4 {
            source.try_get::<_, Option<i32>>(idx)?.map(i64::from).into()
        } else if *ty == Type::INT2 {
            source.try_get::<_, Option<i16>>(idx)?.map(i64::from).into()
        } else if *ty == Type::FLOAT8 {
            source.try_get::<_, Option<f64>>(idx)?.into()
        } else if *ty == Type::FLOAT4 {
            source.try_get::<_, Option<f32>>(idx)?.map(f64::from).into()
        } else if *ty == Type::TEXT || *ty == Type::VARCHAR || *ty == Type::BPCHAR {
            source.try_get::<_, Option<String>>(idx)?.into()
        } else if *ty == Type::BOOL {
            source
                .try_get::<_, Option<bool>>(idx)?
                .map(i64::from)
                .into()
        } else {
            return Err(StorageError::Backend(format!(
                "unsupported column type {ty} for '{name}'"
            )));
        };
        row.insert(name, value);
    }
    Ok(row)
}

fn is_select(template: &str) -> bool {
    template
        .trim_start()
        .get(..6)
        .is_some_and(|head| head.eq_ignore_ascii_case("SELECT"))
}

fn has_returning(template: &str) -> bool {
    template.to_ascii_uppercase().contains("RETURNING")
}

impl Backend for PostgresBackend {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn execute(
        &mut self,
        template: &str,
        params: &[SqlValue],
    ) -> Result<QueryResult, StorageError> {
        let statement = translate_placeholders(template);
        let bind: Vec<&(dyn ToSql + Sync)> =
            params.iter().map(|p| p as &(dyn ToSql + Sync)).collect();

        let reading = is_select(template);
        if reading || has_returning(template) {
            let raw = self.client.query(&statement, &bind)?;
            let mut rows = Vec::with_capacity(raw.len());
            for source in &raw {
                rows.push(map_row(source)?);
            }
            let affected = rows.len() as u64;
            // A write with RETURNING reports the generated id via the
            // first returned row's `id` column, when present.
            let inserted_id = if reading {
                None
            } else {
                rows.first().and_then(|r| r.get_opt_i64("id").ok().flatten())
            };
            Ok(QueryResult {
                rows,
                affected,
                inserted_id,
            })
        } else {
            let affected = self.client.execute(&statement, &bind)?;
            Ok(QueryResult {
                rows: Vec::new(),
                affected,
                inserted_id: None,
            })
        }
    }

    fn auto_primary_key(&self) -> &'static str {
        "BIGSERIAL PRIMARY KEY"
    }

    fn returning_id(&self) -> &'static str {
        " RETURNING id"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_numbers_left_to_right() {
        assert_eq!(
            translate_placeholders("INSERT INTO t (a, b, c) VALUES (?, ?, ?)"),
            "INSERT INTO t (a, b, c) VALUES ($1, $2, $3)"
        );
    }

    #[test]
    fn test_translate_passes_plain_sql_through() {
        assert_eq!(
            translate_placeholders("SELECT * FROM machines"),
            "SELECT * FROM machines"
        );
    }

    #[test]
    fn test_translate_skips_quoted_literals() {
        assert_eq!(
            translate_placeholders("SELECT * FROM t WHERE note = 'why?' AND id = ?"),
            "SELECT * FROM t WHERE note = 'why?' AND id = $1"
        );
        assert_eq!(
            translate_placeholders("UPDATE t SET a = 'it''s?' WHERE b = ?"),
            "UPDATE t SET a = 'it''s?' WHERE b = $1"
        );
    }

    #[test]
    fn test_translate_double_digit_indexes() {
        let template = format!("INSERT INTO t VALUES ({})", vec!["?"; 11].join(", "));
        let translated = translate_placeholders(&template);
        assert!(translated.ends_with("$10, $11)"));
    }

    #[test]
    fn test_returning_detection() {
        assert!(has_returning("INSERT INTO t (a) VALUES (?) RETURNING id"));
        assert!(!has_returning("INSERT INTO t (a) VALUES (?)"));
    }
}
