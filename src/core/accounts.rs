//! Account management
//!
//! Registration, credential verification for an external guard, listing,
//! and removal. Token issuance (JWT, reset links) lives outside the core;
//! this layer only answers "is this password right for this account".

use chrono::Utc;

use crate::core::CoreError;
use crate::entities::{format_timestamp, Account, Role};
use crate::store::{StorageError, Store};

/// Characters the password policy counts as special.
const SPECIAL_CHARS: &str = "!@#$%^&*";

/// Fields of a new registration.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

pub struct AccountService<'a> {
    store: &'a Store,
}

impl<'a> AccountService<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// Register an account with a policy-checked, bcrypt-hashed password.
    pub fn register(&self, new: NewAccount) -> Result<Account, CoreError> {
        if new.username.trim().is_empty() || new.email.trim().is_empty() {
            return Err(CoreError::validation("username and email are required"));
        }
        check_password_complexity(&new.password)?;

        let taken = self.store.execute(
            "SELECT id FROM users WHERE username = ? OR email = ? LIMIT 1",
            &[new.username.clone().into(), new.email.clone().into()],
        )?;
        if !taken.rows.is_empty() {
            return Err(CoreError::validation(
                "username or email is already registered",
            ));
        }

        let hash = bcrypt::hash(&new.password, bcrypt::DEFAULT_COST)
            .map_err(|e| StorageError::Backend(format!("password hashing failed: {e}")))?;
        let template = format!(
            "INSERT INTO users (username, email, password_hash, role, created_at) \
             VALUES (?, ?, ?, ?, ?){}",
            self.store.returning_id()
        );
        let result = self.store.execute(
            &template,
            &[
                new.username.into(),
                new.email.into(),
                hash.into(),
                new.role.to_string().into(),
                format_timestamp(Utc::now()).into(),
            ],
        )?;
        let id = result
            .inserted_id
            .ok_or_else(|| StorageError::Backend("engine reported no generated id".into()))?;
        self.get(id)
    }

    /// Check a password against the account matching `identifier` (email
    /// or username). `None` means no such account or a wrong password;
    /// which of the two is deliberately not disclosed.
    pub fn verify_password(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<Option<Account>, CoreError> {
        let result = self.store.execute(
            "SELECT * FROM users WHERE email = ? OR username = ? LIMIT 1",
            &[identifier.into(), identifier.into()],
        )?;
        let Some(row) = result.rows.first() else {
            return Ok(None);
        };

        let hash = row.get_string("password_hash")?;
        let matches = bcrypt::verify(password, &hash)
            .map_err(|e| StorageError::Backend(format!("password verification failed: {e}")))?;
        if !matches {
            return Ok(None);
        }
        Ok(Some(Account::from_row(row)?))
    }

    pub fn get(&self, user_id: i64) -> Result<Account, CoreError> {
        let result = self.store.execute(
            "SELECT id, username, email, role, created_at FROM users WHERE id = ?",
            &[user_id.into()],
        )?;
        let row = result
            .rows
            .first()
            .ok_or_else(|| CoreError::not_found("user", user_id))?;
        Ok(Account::from_row(row)?)
    }

    pub fn find_by_username(&self, username: &str) -> Result<Account, CoreError> {
        let result = self.store.execute(
            "SELECT id, username, email, role, created_at FROM users WHERE username = ?",
            &[username.into()],
        )?;
        let row = result
            .rows
            .first()
            .ok_or_else(|| CoreError::not_found("user", username))?;
        Ok(Account::from_row(row)?)
    }

    pub fn list(&self) -> Result<Vec<Account>, CoreError> {
        let result = self.store.execute(
            "SELECT id, username, email, role, created_at FROM users \
             ORDER BY created_at DESC, id DESC",
            &[],
        )?;
        result
            .rows
            .iter()
            .map(|row| Account::from_row(row).map_err(CoreError::from))
            .collect()
    }

    /// Admin-only removal. Checklists submitted by the account survive
    /// with their submitter reference cleared.
    pub fn delete(&self, actor_role: Role, user_id: i64) -> Result<(), CoreError> {
        if !actor_role.is_admin() {
            return Err(CoreError::forbidden("only admins can delete accounts"));
        }
        let result = self
            .store
            .execute("DELETE FROM users WHERE id = ?", &[user_id.into()])?;
        if result.affected == 0 {
            return Err(CoreError::not_found("user", user_id));
        }
        Ok(())
    }
}

/// At least 8 characters from the letter/digit/special alphabet, with at
/// least one digit and one special character.
fn check_password_complexity(password: &str) -> Result<(), CoreError> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || SPECIAL_CHARS.contains(c);
    let ok = password.len() >= 8
        && password.chars().all(allowed)
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| SPECIAL_CHARS.contains(c));
    if ok {
        Ok(())
    } else {
        Err(CoreError::validation(
            "password must be at least 8 characters and include a digit and a special character",
        ))
    }
}
