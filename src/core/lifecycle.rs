//! Checklist lifecycle / revision engine
//!
//! A checklist moves Submitted -> Revised(1) -> Revised(2) -> Revised(3),
//! then locks. Every revision snapshots the pre-edit state into the
//! record's edit history and recomputes the stored percentages from the
//! machine's current rates. Revisions are admin-only; the narrower photo
//! retake is open to the original submitter and consumes no edit slot.

use chrono::{Timelike, Utc};
use serde_json::json;

use crate::core::audit::{self, AuditEvent};
use crate::core::notify::{Notifier, NoopNotifier};
use crate::core::{efficiency, CoreError};
use crate::entities::{
    format_timestamp, AuditAction, Checklist, ChecklistSummary, EditSnapshot, Role, Shift,
};
use crate::store::{StorageError, Store};

static NOOP: NoopNotifier = NoopNotifier;

/// Fields of a new submission.
#[derive(Debug, Clone, Default)]
pub struct SubmitChecklist {
    pub machine_id: i64,
    pub user_id: i64,
    pub ok_quantity: i64,
    pub ng_quantity: i64,

    /// Stored as given; defaults to ok+ng when omitted. A divergent value
    /// is accepted, not corrected.
    pub total_quantity: Option<i64>,

    pub device_info: Option<String>,
    pub location: Option<String>,
    pub image_path: Option<String>,
}

/// Partial field set applied by a revision. Omitted fields keep their
/// prior values; photo replacement is optional per revision.
#[derive(Debug, Clone, Default)]
pub struct ChecklistPatch {
    pub ok_quantity: Option<i64>,
    pub ng_quantity: Option<i64>,
    pub total_quantity: Option<i64>,
    pub remarks: Option<String>,
    pub image_path: Option<String>,
    pub proof_path: Option<String>,
    pub device_info: Option<String>,
    pub location: Option<String>,
}

pub struct ChecklistService<'a> {
    store: &'a Store,
    notifier: &'a dyn Notifier,
}

impl<'a> ChecklistService<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self {
            store,
            notifier: &NOOP,
        }
    }

    pub fn with_notifier(store: &'a Store, notifier: &'a dyn Notifier) -> Self {
        Self { store, notifier }
    }

    /// Create a checklist from an operator submission.
    pub fn submit(&self, req: SubmitChecklist) -> Result<Checklist, CoreError> {
        if req.ok_quantity < 0 || req.ng_quantity < 0 {
            return Err(CoreError::validation("quantities must be non-negative"));
        }
        if req.total_quantity.is_some_and(|t| t < 0) {
            return Err(CoreError::validation("total quantity must be non-negative"));
        }

        let (mct, working_hours) = self.machine_rates(req.machine_id)?;
        let total = req.total_quantity.unwrap_or(req.ok_quantity + req.ng_quantity);
        let eff = efficiency::derive(req.ok_quantity, req.ng_quantity, total, mct, working_hours);

        let shift = Shift::from_hour(chrono::Local::now().hour());
        let now = format_timestamp(Utc::now());

        let template = format!(
            "INSERT INTO checklists \
             (machine_id, user_id, ok_quantity, ng_quantity, total_quantity, \
              avg_ng_percent, bekido_percent, image_path, device_info, location, \
              shift, submitted_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?){}",
            self.store.returning_id()
        );
        let result = self.store.execute(
            &template,
            &[
                req.machine_id.into(),
                req.user_id.into(),
                req.ok_quantity.into(),
                req.ng_quantity.into(),
                total.into(),
                eff.defect_percent.into(),
                eff.yield_percent.into(),
                req.image_path.into(),
                req.device_info.into(),
                req.location.into(),
                shift.to_string().into(),
                now.into(),
            ],
        )?;
        let id = result
            .inserted_id
            .ok_or_else(|| StorageError::Backend("engine reported no generated id".into()))?;

        let checklist = self.get(id)?;
        self.notifier.checklist_created(&checklist);
        Ok(checklist)
    }

    /// Apply a bounded revision. Admin-only; each success spends one of
    /// the record's three edit slots and appends one history snapshot.
    pub fn revise(
        &self,
        checklist_id: i64,
        actor_id: i64,
        actor_role: Role,
        patch: ChecklistPatch,
    ) -> Result<Checklist, CoreError> {
        if !actor_role.is_admin() {
            return Err(CoreError::forbidden("only admins can revise checklists"));
        }

        let current = self.get(checklist_id)?;
        if current.is_locked() {
            return Err(CoreError::EditLimitReached(checklist_id));
        }

        let (mct, working_hours) = self.machine_rates(current.machine_id)?;

        let new_ok = patch.ok_quantity.unwrap_or(current.ok_quantity);
        let new_ng = patch.ng_quantity.unwrap_or(current.ng_quantity);
        let new_total = patch.total_quantity.unwrap_or(new_ok + new_ng);
        let eff = efficiency::derive(new_ok, new_ng, new_total, mct, working_hours);

        let snapshot = EditSnapshot {
            ok: current.ok_quantity,
            ng: current.ng_quantity,
            total: current.total_quantity,
            image: current.image_path.clone(),
            edited_by: actor_id,
            edited_at: Utc::now(),
        };
        let mut history = current.edit_history.clone();
        history.push(snapshot.clone());
        let history_raw = serde_json::to_string(&history)
            .map_err(|e| StorageError::Backend(format!("edit_history encoding failed: {e}")))?;

        let photo_replaced = patch.image_path.is_some();
        let final_image = patch.image_path.or(current.image_path);
        let final_proof = patch.proof_path.or(current.approval_proof_path);
        let final_remarks = patch.remarks.or(current.remarks);
        let now = format_timestamp(Utc::now());

        // Guarded on the edit_count we read: a concurrent revision that
        // lands first makes this update match zero rows instead of
        // silently overwriting its history append.
        let updated = self.store.execute(
            "UPDATE checklists SET \
                ok_quantity = ?, ng_quantity = ?, total_quantity = ?, \
                avg_ng_percent = ?, bekido_percent = ?, \
                image_path = ?, approval_proof_path = ?, remarks = ?, \
                revised_by = ?, revised_at = ?, \
                edit_count = ?, edit_history = ? \
             WHERE id = ? AND edit_count = ?",
            &[
                new_ok.into(),
                new_ng.into(),
                new_total.into(),
                eff.defect_percent.into(),
                eff.yield_percent.into(),
                final_image.into(),
                final_proof.into(),
                final_remarks.into(),
                actor_id.into(),
                now.into(),
                (current.edit_count + 1).into(),
                history_raw.into(),
                checklist_id.into(),
                current.edit_count.into(),
            ],
        )?;
        if updated.affected == 0 {
            return Err(CoreError::EditConflict(checklist_id));
        }

        let action = if photo_replaced {
            AuditAction::UpdatePhoto
        } else {
            AuditAction::ReviseChecklist
        };
        let event = AuditEvent {
            user_id: actor_id,
            action,
            table_name: "checklists",
            target_id: checklist_id,
            old_values: json!({
                "ok": snapshot.ok,
                "ng": snapshot.ng,
                "total": snapshot.total,
                "image": snapshot.image,
            }),
            new_values: json!({ "ok": new_ok, "ng": new_ng }),
            device_info: patch.device_info.unwrap_or_else(|| "Admin".to_string()),
            location: patch.location.unwrap_or_else(|| "N/A".to_string()),
        };
        if let Err(e) = audit::record(self.store, &event) {
            eprintln!("Warning: audit log write failed: {}", e);
        }

        self.notifier.checklist_updated(checklist_id);
        self.get(checklist_id)
    }

    /// Photo retake: replaces the image without spending an edit slot or
    /// touching the history. Open to the original submitter and admins.
    pub fn replace_image(
        &self,
        checklist_id: i64,
        actor_id: i64,
        actor_role: Role,
        new_image: &str,
    ) -> Result<(), CoreError> {
        let result = self.store.execute(
            "SELECT user_id FROM checklists WHERE id = ?",
            &[checklist_id.into()],
        )?;
        let row = result
            .rows
            .first()
            .ok_or_else(|| CoreError::not_found("checklist", checklist_id))?;

        let owner = row.get_opt_i64("user_id")?;
        if owner != Some(actor_id) && !actor_role.is_admin() {
            return Err(CoreError::forbidden(
                "only the submitter or an admin can retake this photo",
            ));
        }

        self.store.execute(
            "UPDATE checklists SET image_path = ? WHERE id = ?",
            &[new_image.into(), checklist_id.into()],
        )?;
        Ok(())
    }

    /// Admin-only hard delete. Not a revision: the row is gone for good.
    pub fn delete(&self, checklist_id: i64, actor_role: Role) -> Result<(), CoreError> {
        if !actor_role.is_admin() {
            return Err(CoreError::forbidden("only admins can delete checklists"));
        }
        let result = self.store.execute(
            "DELETE FROM checklists WHERE id = ?",
            &[checklist_id.into()],
        )?;
        if result.affected == 0 {
            return Err(CoreError::not_found("checklist", checklist_id));
        }
        Ok(())
    }

    pub fn get(&self, checklist_id: i64) -> Result<Checklist, CoreError> {
        let result = self.store.execute(
            "SELECT * FROM checklists WHERE id = ?",
            &[checklist_id.into()],
        )?;
        let row = result
            .rows
            .first()
            .ok_or_else(|| CoreError::not_found("checklist", checklist_id))?;
        Ok(Checklist::from_row(row)?)
    }

    /// Most recent submissions with their machine and submitter.
    pub fn recent(&self, limit: i64) -> Result<Vec<ChecklistSummary>, CoreError> {
        let result = self.store.execute(
            "SELECT c.*, m.machine_no, m.model, u.username \
             FROM checklists c \
             JOIN machines m ON c.machine_id = m.id \
             LEFT JOIN users u ON c.user_id = u.id \
             ORDER BY c.submitted_at DESC, c.id DESC LIMIT ?",
            &[limit.into()],
        )?;
        self.map_summaries(result.rows)
    }

    pub fn for_machine(&self, machine_id: i64) -> Result<Vec<ChecklistSummary>, CoreError> {
        let result = self.store.execute(
            "SELECT c.*, m.machine_no, m.model, u.username \
             FROM checklists c \
             JOIN machines m ON c.machine_id = m.id \
             LEFT JOIN users u ON c.user_id = u.id \
             WHERE c.machine_id = ? \
             ORDER BY c.submitted_at DESC, c.id DESC",
            &[machine_id.into()],
        )?;
        self.map_summaries(result.rows)
    }

    pub fn for_submitter(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<ChecklistSummary>, CoreError> {
        let result = self.store.execute(
            "SELECT c.*, m.machine_no, m.model, u.username \
             FROM checklists c \
             JOIN machines m ON c.machine_id = m.id \
             LEFT JOIN users u ON c.user_id = u.id \
             WHERE c.user_id = ? \
             ORDER BY c.submitted_at DESC, c.id DESC LIMIT ?",
            &[user_id.into(), limit.into()],
        )?;
        self.map_summaries(result.rows)
    }

    fn map_summaries(
        &self,
        rows: Vec<crate::store::Row>,
    ) -> Result<Vec<ChecklistSummary>, CoreError> {
        rows.iter()
            .map(|row| ChecklistSummary::from_row(row).map_err(CoreError::from))
            .collect()
    }

    fn machine_rates(&self, machine_id: i64) -> Result<(f64, f64), CoreError> {
        let result = self.store.execute(
            "SELECT mct, working_hours FROM machines WHERE id = ?",
            &[machine_id.into()],
        )?;
        let row = result
            .rows
            .first()
            .ok_or_else(|| CoreError::not_found("machine", machine_id))?;
        Ok((row.get_f64("mct")?, row.get_f64("working_hours")?))
    }
}
