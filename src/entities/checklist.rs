//! Checklist entity - one submitted inspection record
//!
//! A checklist is created once by its submitter and thereafter mutated only
//! through the bounded revision operation. Each revision appends the
//! pre-edit state to `edit_history`; after [`MAX_EDIT_COUNT`] revisions the
//! record is locked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::parse_timestamp;
use crate::store::{Row, StorageError};

/// Revisions allowed before a checklist locks.
pub const MAX_EDIT_COUNT: i64 = 3;

/// Fixed 8-hour wall-clock production shift bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Shift {
    A,
    B,
    C,
}

impl Shift {
    /// Band assignment from the local wall-clock hour at submission:
    /// 06:00-13:59 is A, 14:00-21:59 is B, the night hours are C.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=13 => Shift::A,
            14..=21 => Shift::B,
            _ => Shift::C,
        }
    }
}

impl std::fmt::Display for Shift {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Shift::A => write!(f, "A"),
            Shift::B => write!(f, "B"),
            Shift::C => write!(f, "C"),
        }
    }
}

impl std::str::FromStr for Shift {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(Shift::A),
            "B" => Ok(Shift::B),
            "C" => Ok(Shift::C),
            _ => Err(format!("Unknown shift: {}. Use A, B, or C", s)),
        }
    }
}

/// Pre-edit state captured when a revision is applied.
///
/// Stored as an ordered JSON array in the `edit_history` column; the
/// in-memory form is always this typed sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditSnapshot {
    pub ok: i64,
    pub ng: i64,
    pub total: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,

    pub edited_by: i64,
    pub edited_at: DateTime<Utc>,
}

/// One row of the checklists table.
#[derive(Debug, Clone, Serialize)]
pub struct Checklist {
    pub id: i64,
    pub machine_id: i64,
    pub user_id: Option<i64>,

    pub ok_quantity: i64,
    pub ng_quantity: i64,

    /// Stored independently of ok+ng; a caller-supplied value may diverge
    /// and is kept as given.
    pub total_quantity: i64,

    /// Derived defect ratio, authoritative once stored.
    pub avg_ng_percent: f64,

    /// Derived yield/availability percentage, authoritative once stored.
    pub bekido_percent: f64,

    pub image_path: Option<String>,
    pub approval_proof_path: Option<String>,
    pub device_info: Option<String>,
    pub location: Option<String>,
    pub shift: Shift,
    pub remarks: Option<String>,

    pub edit_count: i64,
    pub edit_history: Vec<EditSnapshot>,
    pub revised_by: Option<i64>,
    pub revised_at: Option<DateTime<Utc>>,

    pub submitted_at: Option<DateTime<Utc>>,
}

impl Checklist {
    /// Locked once all three edit slots are spent; further revisions are
    /// refused.
    pub fn is_locked(&self) -> bool {
        self.edit_count >= MAX_EDIT_COUNT
    }

    pub fn from_row(row: &Row) -> Result<Self, StorageError> {
        let shift = row
            .get_opt_string("shift")?
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(Shift::C);
        let edit_history = match row.get_opt_string("edit_history")? {
            Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                StorageError::Backend(format!("corrupt edit_history: {e}"))
            })?,
            None => Vec::new(),
        };
        Ok(Self {
            id: row.get_i64("id")?,
            machine_id: row.get_i64("machine_id")?,
            user_id: row.get_opt_i64("user_id")?,
            ok_quantity: row.get_opt_i64("ok_quantity")?.unwrap_or(0),
            ng_quantity: row.get_opt_i64("ng_quantity")?.unwrap_or(0),
            total_quantity: row.get_opt_i64("total_quantity")?.unwrap_or(0),
            avg_ng_percent: row.get_f64("avg_ng_percent")?,
            bekido_percent: row.get_f64("bekido_percent")?,
            image_path: row.get_opt_string("image_path")?,
            approval_proof_path: row.get_opt_string("approval_proof_path")?,
            device_info: row.get_opt_string("device_info")?,
            location: row.get_opt_string("location")?,
            shift,
            remarks: row.get_opt_string("remarks")?,
            edit_count: row.get_opt_i64("edit_count")?.unwrap_or(0),
            edit_history,
            revised_by: row.get_opt_i64("revised_by")?,
            revised_at: row
                .get_opt_string("revised_at")?
                .as_deref()
                .and_then(parse_timestamp),
            submitted_at: row
                .get_opt_string("submitted_at")?
                .as_deref()
                .and_then(parse_timestamp),
        })
    }
}

/// Checklist joined with its machine and submitter for listings.
#[derive(Debug, Clone, Serialize)]
pub struct ChecklistSummary {
    #[serde(flatten)]
    pub checklist: Checklist,
    pub machine_no: String,
    pub model: Option<String>,
    pub username: Option<String>,
}

impl ChecklistSummary {
    pub fn from_row(row: &Row) -> Result<Self, StorageError> {
        Ok(Self {
            checklist: Checklist::from_row(row)?,
            machine_no: row.get_string("machine_no")?,
            model: row.get_opt_string("model")?,
            username: row.get_opt_string("username")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shift_bands() {
        assert_eq!(Shift::from_hour(6), Shift::A);
        assert_eq!(Shift::from_hour(13), Shift::A);
        assert_eq!(Shift::from_hour(14), Shift::B);
        assert_eq!(Shift::from_hour(21), Shift::B);
        assert_eq!(Shift::from_hour(22), Shift::C);
        assert_eq!(Shift::from_hour(5), Shift::C);
        assert_eq!(Shift::from_hour(0), Shift::C);
    }

    #[test]
    fn test_shift_parsing() {
        assert_eq!("a".parse::<Shift>().unwrap(), Shift::A);
        assert_eq!(" B ".parse::<Shift>().unwrap(), Shift::B);
        assert!("D".parse::<Shift>().is_err());
    }

    #[test]
    fn test_edit_history_serialization_keeps_order() {
        let history = vec![
            EditSnapshot {
                ok: 100,
                ng: 2,
                total: 102,
                image: None,
                edited_by: 1,
                edited_at: "2025-03-14T09:00:00Z".parse().unwrap(),
            },
            EditSnapshot {
                ok: 110,
                ng: 2,
                total: 112,
                image: Some("uploads/check-1.jpg".into()),
                edited_by: 1,
                edited_at: "2025-03-14T10:00:00Z".parse().unwrap(),
            },
        ];
        let raw = serde_json::to_string(&history).unwrap();
        let back: Vec<EditSnapshot> = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, history);
        assert_eq!(back[0].ok, 100);
        assert_eq!(back[1].image.as_deref(), Some("uploads/check-1.jpg"));
    }
}
