//! Schema bootstrap and seed data
//!
//! Safe to run on every process start. Table creation is `IF NOT EXISTS`
//! and seeding is check-then-insert (one engine in use offers no conflict
//! target for every case, so upserts are off the table).

use crate::core::CoreError;
use crate::entities::format_timestamp;
use crate::store::{StorageError, Store};

/// Username/password pairs installed on first start.
pub const SEED_ADMIN: (&str, &str) = ("admin", "admin");
pub const SEED_OPERATOR: (&str, &str) = ("operator", "operator123");

const SEED_COMPANY_NAME: &str = "Genba Manufacturing";

/// Create the five tables if absent and install seed rows once.
pub fn initialize(store: &Store) -> Result<(), CoreError> {
    eprintln!("genba: {} backend selected", store.backend_name());

    for statement in table_statements(store) {
        store.execute(&statement, &[])?;
    }
    seed(store)?;
    Ok(())
}

fn table_statements(store: &Store) -> Vec<String> {
    let pk = store.auto_primary_key();
    vec![
        format!(
            "CREATE TABLE IF NOT EXISTS users (
                id {pk},
                username TEXT UNIQUE,
                email TEXT UNIQUE,
                password_hash TEXT,
                role TEXT DEFAULT 'operator',
                created_at TEXT
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS machines (
                id {pk},
                machine_no TEXT UNIQUE,
                line_no TEXT,
                model TEXT,
                prod_plan BIGINT DEFAULT 0,
                prod_plan_actual BIGINT DEFAULT 0,
                mct DOUBLE PRECISION DEFAULT 0,
                working_hours DOUBLE PRECISION DEFAULT 8,
                created_at TEXT
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS checklists (
                id {pk},
                machine_id BIGINT NOT NULL REFERENCES machines(id) ON DELETE CASCADE,
                user_id BIGINT REFERENCES users(id) ON DELETE SET NULL,
                ok_quantity BIGINT DEFAULT 0,
                ng_quantity BIGINT DEFAULT 0,
                total_quantity BIGINT DEFAULT 0,
                avg_ng_percent DOUBLE PRECISION DEFAULT 0,
                bekido_percent DOUBLE PRECISION DEFAULT 0,
                image_path TEXT,
                approval_proof_path TEXT,
                device_info TEXT,
                location TEXT,
                shift TEXT,
                remarks TEXT,
                edit_count BIGINT DEFAULT 0,
                edit_history TEXT,
                revised_by BIGINT,
                revised_at TEXT,
                submitted_at TEXT NOT NULL
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS audit_logs (
                id {pk},
                user_id BIGINT,
                action TEXT,
                table_name TEXT,
                target_id BIGINT,
                old_values TEXT,
                new_values TEXT,
                device_info TEXT,
                location TEXT,
                logged_at TEXT
            )"
        ),
        format!(
            "CREATE TABLE IF NOT EXISTS organization_settings (
                id {pk},
                company_name TEXT,
                logo_url TEXT,
                plant_no TEXT,
                address TEXT,
                subscription_plan TEXT DEFAULT 'trial',
                trial_ends_at TEXT,
                updated_at TEXT
            )"
        ),
    ]
}

fn seed(store: &Store) -> Result<(), CoreError> {
    let now = format_timestamp(chrono::Utc::now());

    let orgs = store.execute("SELECT id FROM organization_settings LIMIT 1", &[])?;
    if orgs.rows.is_empty() {
        store.execute(
            "INSERT INTO organization_settings (company_name, subscription_plan, updated_at) \
             VALUES (?, ?, ?)",
            &[SEED_COMPANY_NAME.into(), "trial".into(), now.clone().into()],
        )?;
    }

    let admins = store.execute("SELECT id FROM users WHERE role = 'admin' LIMIT 1", &[])?;
    if admins.rows.is_empty() {
        let (username, password) = SEED_ADMIN;
        insert_account(store, username, "admin@example.com", password, "admin", &now)?;
        eprintln!("genba: seeded admin account");
    }

    let operators = store.execute(
        "SELECT id FROM users WHERE username = ? LIMIT 1",
        &[SEED_OPERATOR.0.into()],
    )?;
    if operators.rows.is_empty() {
        let (username, password) = SEED_OPERATOR;
        insert_account(
            store,
            username,
            "operator@example.com",
            password,
            "operator",
            &now,
        )?;
        eprintln!("genba: seeded operator account");
    }

    Ok(())
}

fn insert_account(
    store: &Store,
    username: &str,
    email: &str,
    password: &str,
    role: &str,
    now: &str,
) -> Result<(), CoreError> {
    let hash = bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| StorageError::Backend(format!("password hashing failed: {e}")))?;
    store.execute(
        "INSERT INTO users (username, email, password_hash, role, created_at) \
         VALUES (?, ?, ?, ?, ?)",
        &[
            username.into(),
            email.into(),
            hash.into(),
            role.into(),
            now.into(),
        ],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteBackend;

    fn memory_store() -> Store {
        Store::new(Box::new(SqliteBackend::open_in_memory().unwrap()))
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let store = memory_store();
        initialize(&store).unwrap();
        initialize(&store).unwrap();

        let orgs = store
            .execute("SELECT id FROM organization_settings", &[])
            .unwrap();
        assert_eq!(orgs.rows.len(), 1);

        let admins = store
            .execute("SELECT id FROM users WHERE role = 'admin'", &[])
            .unwrap();
        assert_eq!(admins.rows.len(), 1);

        let operators = store
            .execute("SELECT id FROM users WHERE username = ?", &["operator".into()])
            .unwrap();
        assert_eq!(operators.rows.len(), 1);
    }

    #[test]
    fn test_seed_org_starts_on_trial() {
        let store = memory_store();
        initialize(&store).unwrap();

        let orgs = store
            .execute(
                "SELECT subscription_plan FROM organization_settings LIMIT 1",
                &[],
            )
            .unwrap();
        assert_eq!(
            orgs.rows[0].get_string("subscription_plan").unwrap(),
            "trial"
        );
    }

    #[test]
    fn test_seeded_credentials_verify() {
        let store = memory_store();
        initialize(&store).unwrap();

        let result = store
            .execute(
                "SELECT password_hash FROM users WHERE username = ?",
                &["admin".into()],
            )
            .unwrap();
        let hash = result.rows[0].get_string("password_hash").unwrap();
        assert!(bcrypt::verify(SEED_ADMIN.1, &hash).unwrap());
        assert!(!bcrypt::verify("wrong", &hash).unwrap());
    }
}
