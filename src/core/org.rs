//! Organization settings - singleton get/update

use chrono::Utc;

use crate::core::CoreError;
use crate::entities::{format_timestamp, OrganizationSettings, Role};
use crate::store::Store;

/// Partial settings update; omitted fields keep their stored values.
#[derive(Debug, Clone, Default)]
pub struct OrgPatch {
    pub company_name: Option<String>,
    pub logo_url: Option<String>,
    pub plant_no: Option<String>,
    pub address: Option<String>,
}

pub struct OrgService<'a> {
    store: &'a Store,
}

impl<'a> OrgService<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub fn get(&self) -> Result<OrganizationSettings, CoreError> {
        let result = self
            .store
            .execute("SELECT * FROM organization_settings LIMIT 1", &[])?;
        let row = result
            .rows
            .first()
            .ok_or_else(|| CoreError::not_found("organization settings", "singleton"))?;
        Ok(OrganizationSettings::from_row(row)?)
    }

    /// Update the singleton row in place; creates it if bootstrap has not
    /// run. Admin-only. Never produces a second row.
    pub fn update(
        &self,
        actor_role: Role,
        patch: OrgPatch,
    ) -> Result<OrganizationSettings, CoreError> {
        if !actor_role.is_admin() {
            return Err(CoreError::forbidden(
                "only admins can update organization settings",
            ));
        }

        let now = format_timestamp(Utc::now());
        let existing = self
            .store
            .execute("SELECT id FROM organization_settings LIMIT 1", &[])?;

        if let Some(row) = existing.rows.first() {
            let id = row.get_i64("id")?;
            self.store.execute(
                "UPDATE organization_settings SET \
                    company_name = COALESCE(?, company_name), \
                    logo_url = COALESCE(?, logo_url), \
                    plant_no = COALESCE(?, plant_no), \
                    address = COALESCE(?, address), \
                    updated_at = ? \
                 WHERE id = ?",
                &[
                    patch.company_name.into(),
                    patch.logo_url.into(),
                    patch.plant_no.into(),
                    patch.address.into(),
                    now.into(),
                    id.into(),
                ],
            )?;
        } else {
            self.store.execute(
                "INSERT INTO organization_settings \
                 (company_name, logo_url, plant_no, address, subscription_plan, updated_at) \
                 VALUES (?, ?, ?, ?, 'trial', ?)",
                &[
                    patch.company_name.into(),
                    patch.logo_url.into(),
                    patch.plant_no.into(),
                    patch.address.into(),
                    now.into(),
                ],
            )?;
        }

        self.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bootstrap;
    use crate::entities::SubscriptionPlan;
    use crate::store::SqliteBackend;

    fn seeded_store() -> Store {
        let store = Store::new(Box::new(SqliteBackend::open_in_memory().unwrap()));
        bootstrap::initialize(&store).unwrap();
        store
    }

    #[test]
    fn test_get_returns_seeded_singleton() {
        let store = seeded_store();
        let settings = OrgService::new(&store).get().unwrap();
        assert_eq!(settings.subscription_plan, SubscriptionPlan::Trial);
        assert!(settings.company_name.is_some());
    }

    #[test]
    fn test_update_is_admin_only() {
        let store = seeded_store();
        let err = OrgService::new(&store)
            .update(Role::Operator, OrgPatch::default())
            .unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
    }

    #[test]
    fn test_update_merges_and_keeps_one_row() {
        let store = seeded_store();
        let service = OrgService::new(&store);

        let updated = service
            .update(
                Role::Admin,
                OrgPatch {
                    plant_no: Some("P-7".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.plant_no.as_deref(), Some("P-7"));
        // Untouched fields survive the partial update.
        assert!(updated.company_name.is_some());
        assert!(updated.updated_at.is_some());

        service
            .update(
                Role::Admin,
                OrgPatch {
                    address: Some("1-2-3 Factory Way".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        let count = store
            .execute("SELECT id FROM organization_settings", &[])
            .unwrap();
        assert_eq!(count.rows.len(), 1);
    }
}
