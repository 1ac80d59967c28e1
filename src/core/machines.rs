//! Machine management
//!
//! Creation is gated by the subscription plan: the trial tier allows a
//! single machine, checked by reading the organization settings and
//! counting existing machines before the insert.

use chrono::Utc;

use crate::core::CoreError;
use crate::entities::{format_timestamp, Machine, Role, SubscriptionPlan};
use crate::store::{StorageError, Store};

/// Machines allowed under the trial plan.
pub const TRIAL_MACHINE_LIMIT: i64 = 1;

/// Fields of a new machine registration.
#[derive(Debug, Clone)]
pub struct NewMachine {
    pub machine_no: String,
    pub line_no: Option<String>,
    pub model: Option<String>,
    pub prod_plan: i64,
    pub prod_plan_actual: i64,
    pub mct: f64,
    pub working_hours: f64,
}

impl Default for NewMachine {
    fn default() -> Self {
        Self {
            machine_no: String::new(),
            line_no: None,
            model: None,
            prod_plan: 0,
            prod_plan_actual: 0,
            mct: 0.0,
            working_hours: 8.0,
        }
    }
}

/// Partial machine update; omitted fields keep their stored values.
#[derive(Debug, Clone, Default)]
pub struct MachinePatch {
    pub machine_no: Option<String>,
    pub line_no: Option<String>,
    pub model: Option<String>,
    pub prod_plan: Option<i64>,
    pub prod_plan_actual: Option<i64>,
    pub mct: Option<f64>,
    pub working_hours: Option<f64>,
}

pub struct MachineService<'a> {
    store: &'a Store,
}

impl<'a> MachineService<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Register a machine. Admin-only; refused with `TrialLimitReached`
    /// when the trial cap is already spent.
    pub fn create(&self, actor_role: Role, new: NewMachine) -> Result<Machine, CoreError> {
        if !actor_role.is_admin() {
            return Err(CoreError::forbidden("only admins can register machines"));
        }
        if new.machine_no.trim().is_empty() {
            return Err(CoreError::validation("machine_no is required"));
        }

        self.check_plan_allows_another()?;

        let template = format!(
            "INSERT INTO machines \
             (machine_no, line_no, model, prod_plan, prod_plan_actual, mct, \
              working_hours, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?){}",
            self.store.returning_id()
        );
        let result = self.store.execute(
            &template,
            &[
                new.machine_no.into(),
                new.line_no.into(),
                new.model.into(),
                new.prod_plan.into(),
                new.prod_plan_actual.into(),
                new.mct.into(),
                new.working_hours.into(),
                format_timestamp(Utc::now()).into(),
            ],
        )?;
        let id = result
            .inserted_id
            .ok_or_else(|| StorageError::Backend("engine reported no generated id".into()))?;
        self.get(id)
    }

    /// Partial update with COALESCE semantics. Admin-only.
    pub fn update(
        &self,
        actor_role: Role,
        machine_id: i64,
        patch: MachinePatch,
    ) -> Result<Machine, CoreError> {
        if !actor_role.is_admin() {
            return Err(CoreError::forbidden("only admins can update machines"));
        }

        let result = self.store.execute(
            "UPDATE machines SET \
                machine_no = COALESCE(?, machine_no), \
                line_no = COALESCE(?, line_no), \
                model = COALESCE(?, model), \
                prod_plan = COALESCE(?, prod_plan), \
                prod_plan_actual = COALESCE(?, prod_plan_actual), \
                mct = COALESCE(?, mct), \
                working_hours = COALESCE(?, working_hours) \
             WHERE id = ?",
            &[
                patch.machine_no.into(),
                patch.line_no.into(),
                patch.model.into(),
                patch.prod_plan.into(),
                patch.prod_plan_actual.into(),
                patch.mct.into(),
                patch.working_hours.into(),
                machine_id.into(),
            ],
        )?;
        if result.affected == 0 {
            return Err(CoreError::not_found("machine", machine_id));
        }
        self.get(machine_id)
    }

    /// Admin-only removal; referencing checklists cascade away with it.
    pub fn delete(&self, actor_role: Role, machine_id: i64) -> Result<(), CoreError> {
        if !actor_role.is_admin() {
            return Err(CoreError::forbidden("only admins can delete machines"));
        }
        let result = self
            .store
            .execute("DELETE FROM machines WHERE id = ?", &[machine_id.into()])?;
        if result.affected == 0 {
            return Err(CoreError::not_found("machine", machine_id));
        }
        Ok(())
    }

    pub fn get(&self, machine_id: i64) -> Result<Machine, CoreError> {
        let result = self
            .store
            .execute("SELECT * FROM machines WHERE id = ?", &[machine_id.into()])?;
        let row = result
            .rows
            .first()
            .ok_or_else(|| CoreError::not_found("machine", machine_id))?;
        Ok(Machine::from_row(row)?)
    }

    pub fn list(&self) -> Result<Vec<Machine>, CoreError> {
        let result = self
            .store
            .execute("SELECT * FROM machines ORDER BY machine_no ASC", &[])?;
        result
            .rows
            .iter()
            .map(|row| Machine::from_row(row).map_err(CoreError::from))
            .collect()
    }

    fn check_plan_allows_another(&self) -> Result<(), CoreError> {
        let result = self.store.execute(
            "SELECT subscription_plan FROM organization_settings LIMIT 1",
            &[],
        )?;
        let plan = result
            .rows
            .first()
            .and_then(|row| row.get_opt_string("subscription_plan").ok().flatten())
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(SubscriptionPlan::Trial);

        if plan == SubscriptionPlan::Trial {
            let count_result = self.store.execute(
                "SELECT CAST(COUNT(*) AS BIGINT) AS count FROM machines",
                &[],
            )?;
            let count = count_result
                .rows
                .first()
                .map(|row| row.get_i64("count"))
                .transpose()?
                .unwrap_or(0);
            if count >= TRIAL_MACHINE_LIMIT {
                return Err(CoreError::TrialLimitReached);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bootstrap;
    use crate::store::SqliteBackend;

    fn seeded_store() -> Store {
        let store = Store::new(Box::new(SqliteBackend::open_in_memory().unwrap()));
        bootstrap::initialize(&store).unwrap();
        store
    }

    fn upgrade_plan(store: &Store) {
        store
            .execute(
                "UPDATE organization_settings SET subscription_plan = ?",
                &["paid".into()],
            )
            .unwrap();
    }

    fn sample_machine(machine_no: &str) -> NewMachine {
        NewMachine {
            machine_no: machine_no.to_string(),
            line_no: Some("L1".to_string()),
            model: Some("FX-200".to_string()),
            prod_plan: 1600,
            mct: 18.0,
            working_hours: 8.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_create_requires_admin() {
        let store = seeded_store();
        let service = MachineService::new(&store);
        let err = service
            .create(Role::Operator, sample_machine("M-01"))
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
    }

    #[test]
    fn test_trial_cap_allows_exactly_one_machine() {
        let store = seeded_store();
        let service = MachineService::new(&store);

        let machine = service.create(Role::Admin, sample_machine("M-01")).unwrap();
        assert_eq!(machine.machine_no, "M-01");
        assert_eq!(machine.mct, 18.0);

        let err = service
            .create(Role::Admin, sample_machine("M-02"))
            .unwrap_err();
        assert!(matches!(err, CoreError::TrialLimitReached));
    }

    #[test]
    fn test_paid_plan_lifts_the_cap() {
        let store = seeded_store();
        upgrade_plan(&store);
        let service = MachineService::new(&store);

        service.create(Role::Admin, sample_machine("M-01")).unwrap();
        service.create(Role::Admin, sample_machine("M-02")).unwrap();
        assert_eq!(service.list().unwrap().len(), 2);
    }

    #[test]
    fn test_update_keeps_omitted_fields() {
        let store = seeded_store();
        let service = MachineService::new(&store);
        let machine = service.create(Role::Admin, sample_machine("M-01")).unwrap();

        let updated = service
            .update(
                Role::Admin,
                machine.id,
                MachinePatch {
                    mct: Some(20.0),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.mct, 20.0);
        assert_eq!(updated.machine_no, "M-01");
        assert_eq!(updated.line_no.as_deref(), Some("L1"));
        assert_eq!(updated.working_hours, 8.0);
    }

    #[test]
    fn test_update_and_delete_missing_machine() {
        let store = seeded_store();
        let service = MachineService::new(&store);

        let err = service
            .update(Role::Admin, 42, MachinePatch::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));

        let err = service.delete(Role::Admin, 42).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));

        let err = service.delete(Role::Operator, 42).unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
    }

    #[test]
    fn test_validation_rejects_blank_machine_no() {
        let store = seeded_store();
        let service = MachineService::new(&store);
        let err = service
            .create(Role::Admin, NewMachine::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }
}
