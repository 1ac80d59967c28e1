//! Machine entity - a production machine registered for inspection

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::parse_timestamp;
use crate::store::{Row, StorageError};

/// One row of the machines table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Machine {
    pub id: i64,

    /// Unique machine number, printed on the machine's QR label.
    pub machine_no: String,

    /// Production line the machine sits on.
    pub line_no: Option<String>,

    pub model: Option<String>,

    /// Standard daily target count.
    pub prod_plan: i64,

    /// Today's revised target.
    pub prod_plan_actual: i64,

    /// Machine cycle time: standard seconds to produce one unit.
    pub mct: f64,

    /// Shift length in hours.
    pub working_hours: f64,

    pub created_at: Option<DateTime<Utc>>,
}

impl Machine {
    pub fn from_row(row: &Row) -> Result<Self, StorageError> {
        Ok(Self {
            id: row.get_i64("id")?,
            machine_no: row.get_string("machine_no")?,
            line_no: row.get_opt_string("line_no")?,
            model: row.get_opt_string("model")?,
            prod_plan: row.get_opt_i64("prod_plan")?.unwrap_or(0),
            prod_plan_actual: row.get_opt_i64("prod_plan_actual")?.unwrap_or(0),
            mct: row.get_f64("mct")?,
            working_hours: row.get_f64("working_hours")?,
            created_at: row
                .get_opt_string("created_at")?
                .as_deref()
                .and_then(parse_timestamp),
        })
    }

    /// Theoretical maximum output for one shift, in units.
    ///
    /// Zero when the cycle time is unset, so yield math never divides by
    /// zero.
    pub fn theoretical_max(&self) -> f64 {
        if self.mct <= 0.0 {
            return 0.0;
        }
        (self.working_hours * 3600.0) / self.mct
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqlValue;

    fn sample_row() -> Row {
        let mut row = Row::new();
        row.insert("id", SqlValue::Integer(1));
        row.insert("machine_no", SqlValue::Text("M-01".into()));
        row.insert("line_no", SqlValue::Text("L1".into()));
        row.insert("model", SqlValue::Null);
        row.insert("prod_plan", SqlValue::Integer(1600));
        row.insert("prod_plan_actual", SqlValue::Null);
        row.insert("mct", SqlValue::Real(18.0));
        row.insert("working_hours", SqlValue::Real(8.0));
        row.insert("created_at", SqlValue::Text("2025-03-14T09:00:00Z".into()));
        row
    }

    #[test]
    fn test_from_row() {
        let machine = Machine::from_row(&sample_row()).unwrap();
        assert_eq!(machine.machine_no, "M-01");
        assert_eq!(machine.model, None);
        assert_eq!(machine.prod_plan_actual, 0);
        assert!(machine.created_at.is_some());
    }

    #[test]
    fn test_theoretical_max() {
        let mut machine = Machine::from_row(&sample_row()).unwrap();
        assert_eq!(machine.theoretical_max(), 1600.0);

        machine.mct = 0.0;
        assert_eq!(machine.theoretical_max(), 0.0);
    }
}
