//! Audit log writer and reader

use serde_json::Value;

use crate::core::CoreError;
use crate::entities::{format_timestamp, AuditAction, AuditEntry};
use crate::store::{SqlValue, StorageError, Store};

/// One action to append to the audit log.
#[derive(Debug)]
pub struct AuditEvent {
    pub user_id: i64,
    pub action: AuditAction,
    pub table_name: &'static str,
    pub target_id: i64,
    pub old_values: Value,
    pub new_values: Value,
    pub device_info: String,
    pub location: String,
}

/// Append one entry. Entries are immutable; there is no update or delete.
pub fn record(store: &Store, event: &AuditEvent) -> Result<(), StorageError> {
    let now = format_timestamp(chrono::Utc::now());
    store.execute(
        "INSERT INTO audit_logs \
         (user_id, action, table_name, target_id, old_values, new_values, \
          device_info, location, logged_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        &[
            event.user_id.into(),
            event.action.to_string().into(),
            event.table_name.into(),
            event.target_id.into(),
            event.old_values.to_string().into(),
            event.new_values.to_string().into(),
            SqlValue::Text(event.device_info.clone()),
            SqlValue::Text(event.location.clone()),
            now.into(),
        ],
    )?;
    Ok(())
}

/// Most recent entries, newest first.
pub fn recent(store: &Store, limit: i64) -> Result<Vec<AuditEntry>, CoreError> {
    let result = store.execute(
        "SELECT id, user_id, action, table_name, target_id, old_values, new_values, \
                device_info, location, logged_at \
         FROM audit_logs ORDER BY logged_at DESC, id DESC LIMIT ?",
        &[limit.into()],
    )?;
    result
        .rows
        .iter()
        .map(|row| AuditEntry::from_row(row).map_err(CoreError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bootstrap;
    use crate::store::SqliteBackend;
    use serde_json::json;

    fn seeded_store() -> Store {
        let store = Store::new(Box::new(SqliteBackend::open_in_memory().unwrap()));
        bootstrap::initialize(&store).unwrap();
        store
    }

    #[test]
    fn test_record_and_read_back() {
        let store = seeded_store();
        record(
            &store,
            &AuditEvent {
                user_id: 1,
                action: AuditAction::ReviseChecklist,
                table_name: "checklists",
                target_id: 9,
                old_values: json!({"ok": 100}),
                new_values: json!({"ok": 120}),
                device_info: "Admin".to_string(),
                location: "N/A".to_string(),
            },
        )
        .unwrap();

        let entries = recent(&store, 10).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].action, "REVISE_CHECKLIST");
        assert_eq!(entries[0].target_id, Some(9));
        assert!(entries[0].old_values.as_deref().unwrap().contains("100"));
    }
}
