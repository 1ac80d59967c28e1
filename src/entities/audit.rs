//! Audit log entity - append-only record of revision side effects

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entities::parse_timestamp;
use crate::store::{Row, StorageError};

/// Action tag attached to an audit entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AuditAction {
    /// Quantity/remark revision on a submitted checklist.
    ReviseChecklist,
    /// Revision that also replaced the checklist photo.
    UpdatePhoto,
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditAction::ReviseChecklist => write!(f, "REVISE_CHECKLIST"),
            AuditAction::UpdatePhoto => write!(f, "UPDATE_PHOTO"),
        }
    }
}

/// One row of the audit_logs table. Never updated or deleted by the core.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntry {
    pub id: i64,
    pub user_id: Option<i64>,
    pub action: String,
    pub table_name: String,
    pub target_id: Option<i64>,

    /// Serialized snapshot of the state before the action.
    pub old_values: Option<String>,

    /// Serialized snapshot of the state after the action.
    pub new_values: Option<String>,

    pub device_info: Option<String>,
    pub location: Option<String>,
    pub logged_at: Option<DateTime<Utc>>,
}

impl AuditEntry {
    pub fn from_row(row: &Row) -> Result<Self, StorageError> {
        Ok(Self {
            id: row.get_i64("id")?,
            user_id: row.get_opt_i64("user_id")?,
            action: row.get_string("action")?,
            table_name: row.get_string("table_name")?,
            target_id: row.get_opt_i64("target_id")?,
            old_values: row.get_opt_string("old_values")?,
            new_values: row.get_opt_string("new_values")?,
            device_info: row.get_opt_string("device_info")?,
            location: row.get_opt_string("location")?,
            logged_at: row
                .get_opt_string("logged_at")?
                .as_deref()
                .and_then(parse_timestamp),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_tags() {
        assert_eq!(AuditAction::ReviseChecklist.to_string(), "REVISE_CHECKLIST");
        assert_eq!(AuditAction::UpdatePhoto.to_string(), "UPDATE_PHOTO");
    }
}
