//! Aggregation queries feeding the analytics views
//!
//! Read-only, idempotent, and safe to run while submissions land; a
//! checklist written a moment ago may or may not appear depending on read
//! timing. Aggregates are CAST explicitly so both engines report the same
//! value classes (PostgreSQL's SUM over BIGINT is NUMERIC otherwise).

use chrono::{Duration, Utc};
use serde::Serialize;

use crate::core::CoreError;
use crate::entities::{format_timestamp, Shift};
use crate::store::Store;

/// One (date, shift) group of the production trend.
#[derive(Debug, Clone, Serialize)]
pub struct TrendRow {
    /// Calendar date in `YYYY-MM-DD`.
    pub date: String,
    pub shift: Shift,
    pub total: i64,
    pub ok: i64,
    pub ng: i64,
}

/// One machine's roll-up over the trailing window.
#[derive(Debug, Clone, Serialize)]
pub struct EfficiencyRow {
    pub machine_no: String,
    pub model: Option<String>,
    pub prod_plan: i64,
    pub total_ok: i64,
    pub total_ng: i64,
    pub submission_count: i64,

    /// Mean of the stored bekido percentages; 0 with no submissions.
    pub avg_bekido: f64,
}

/// Production trend: checklists in the trailing window grouped by calendar
/// date and shift, date ascending then shift letter ascending.
pub fn trend_by_shift(store: &Store, window_days: i64) -> Result<Vec<TrendRow>, CoreError> {
    let cutoff = format_timestamp(Utc::now() - Duration::days(window_days));
    let result = store.execute(
        "SELECT substr(submitted_at, 1, 10) AS date, shift, \
                CAST(SUM(total_quantity) AS BIGINT) AS total, \
                CAST(SUM(ok_quantity) AS BIGINT) AS ok, \
                CAST(SUM(ng_quantity) AS BIGINT) AS ng \
         FROM checklists \
         WHERE submitted_at >= ? \
         GROUP BY 1, shift \
         ORDER BY 1 ASC, shift ASC",
        &[cutoff.into()],
    )?;

    let mut rows = Vec::with_capacity(result.rows.len());
    for row in &result.rows {
        let shift = row
            .get_opt_string("shift")?
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(Shift::C);
        rows.push(TrendRow {
            date: row.get_string("date")?,
            shift,
            total: row.get_i64("total")?,
            ok: row.get_i64("ok")?,
            ng: row.get_i64("ng")?,
        });
    }
    Ok(rows)
}

/// Per-machine efficiency: every machine appears, joined against its
/// windowed checklists; machines with none report zero sums and a zero
/// average.
pub fn efficiency_by_machine(
    store: &Store,
    window_days: i64,
) -> Result<Vec<EfficiencyRow>, CoreError> {
    let cutoff = format_timestamp(Utc::now() - Duration::days(window_days));
    let result = store.execute(
        "SELECT m.machine_no, m.model, m.prod_plan, \
                CAST(COALESCE(SUM(c.ok_quantity), 0) AS BIGINT) AS total_ok, \
                CAST(COALESCE(SUM(c.ng_quantity), 0) AS BIGINT) AS total_ng, \
                CAST(COUNT(c.id) AS BIGINT) AS submission_count, \
                CAST(COALESCE(AVG(c.bekido_percent), 0) AS DOUBLE PRECISION) AS avg_bekido \
         FROM machines m \
         LEFT JOIN checklists c ON m.id = c.machine_id AND c.submitted_at >= ? \
         GROUP BY m.id, m.machine_no, m.model, m.prod_plan \
         ORDER BY total_ok DESC",
        &[cutoff.into()],
    )?;

    let mut rows = Vec::with_capacity(result.rows.len());
    for row in &result.rows {
        rows.push(EfficiencyRow {
            machine_no: row.get_string("machine_no")?,
            model: row.get_opt_string("model")?,
            prod_plan: row.get_opt_i64("prod_plan")?.unwrap_or(0),
            total_ok: row.get_i64("total_ok")?,
            total_ng: row.get_i64("total_ng")?,
            submission_count: row.get_i64("submission_count")?,
            avg_bekido: row.get_f64("avg_bekido")?,
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bootstrap;
    use crate::store::{SqliteBackend, Store};

    fn seeded_store() -> Store {
        let store = Store::new(Box::new(SqliteBackend::open_in_memory().unwrap()));
        bootstrap::initialize(&store).unwrap();
        store
    }

    fn add_machine(store: &Store, machine_no: &str) -> i64 {
        store
            .execute(
                "INSERT INTO machines (machine_no, prod_plan, mct, working_hours, created_at) \
                 VALUES (?, ?, ?, ?, ?)",
                &[
                    machine_no.into(),
                    1600i64.into(),
                    18.0.into(),
                    8.0.into(),
                    format_timestamp(Utc::now()).into(),
                ],
            )
            .unwrap()
            .inserted_id
            .unwrap()
    }

    #[allow(clippy::too_many_arguments)]
    fn add_checklist(
        store: &Store,
        machine_id: i64,
        shift: &str,
        ok: i64,
        ng: i64,
        total: i64,
        bekido: f64,
        submitted_at: &str,
    ) {
        store
            .execute(
                "INSERT INTO checklists \
                 (machine_id, user_id, ok_quantity, ng_quantity, total_quantity, \
                  avg_ng_percent, bekido_percent, shift, submitted_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
                &[
                    machine_id.into(),
                    1i64.into(),
                    ok.into(),
                    ng.into(),
                    total.into(),
                    0.0.into(),
                    bekido.into(),
                    shift.into(),
                    submitted_at.into(),
                ],
            )
            .unwrap();
    }

    #[test]
    fn test_trend_groups_by_date_and_shift() {
        let store = seeded_store();
        let machine_id = add_machine(&store, "M-01");
        let today = format_timestamp(Utc::now());
        let date = today[..10].to_string();

        add_checklist(&store, machine_id, "B", 200, 4, 204, 80.0, &today);
        add_checklist(&store, machine_id, "A", 100, 2, 102, 90.0, &today);
        add_checklist(&store, machine_id, "C", 50, 1, 51, 70.0, &today);
        // Second A-shift submission on the same date folds into one group.
        add_checklist(&store, machine_id, "A", 10, 0, 10, 95.0, &today);

        let rows = trend_by_shift(&store, 7).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].shift, Shift::A);
        assert_eq!(rows[1].shift, Shift::B);
        assert_eq!(rows[2].shift, Shift::C);
        assert!(rows.iter().all(|r| r.date == date));

        assert_eq!(rows[0].ok, 110);
        assert_eq!(rows[0].total, 112);
        assert_eq!(rows[1].ng, 4);
        assert_eq!(rows[2].total, 51);
    }

    #[test]
    fn test_trend_excludes_rows_outside_window() {
        let store = seeded_store();
        let machine_id = add_machine(&store, "M-01");
        let stale = format_timestamp(Utc::now() - Duration::days(40));

        add_checklist(&store, machine_id, "A", 100, 2, 102, 90.0, &stale);
        assert!(trend_by_shift(&store, 7).unwrap().is_empty());
        assert_eq!(trend_by_shift(&store, 60).unwrap().len(), 1);
    }

    #[test]
    fn test_efficiency_covers_idle_machines() {
        let store = seeded_store();
        let busy = add_machine(&store, "M-01");
        add_machine(&store, "M-02");
        let today = format_timestamp(Utc::now());

        add_checklist(&store, busy, "A", 1440, 60, 1500, 90.0, &today);
        add_checklist(&store, busy, "B", 1500, 60, 1560, 93.75, &today);

        let rows = efficiency_by_machine(&store, 30).unwrap();
        assert_eq!(rows.len(), 2);

        // Ordered by total OK descending: the busy machine leads.
        assert_eq!(rows[0].machine_no, "M-01");
        assert_eq!(rows[0].total_ok, 2940);
        assert_eq!(rows[0].total_ng, 120);
        assert_eq!(rows[0].submission_count, 2);
        assert_eq!(rows[0].avg_bekido, 91.875);

        assert_eq!(rows[1].machine_no, "M-02");
        assert_eq!(rows[1].total_ok, 0);
        assert_eq!(rows[1].submission_count, 0);
        assert_eq!(rows[1].avg_bekido, 0.0);
    }
}
