//! Account entity - submitters and admins

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::entities::parse_timestamp;
use crate::store::{Row, StorageError};

/// Account role. Admins manage machines, revisions, and accounts;
/// operators submit checklists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum Role {
    Admin,
    #[default]
    Operator,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Operator => write!(f, "operator"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "operator" => Ok(Role::Operator),
            _ => Err(format!("Unknown role: {}. Use admin or operator", s)),
        }
    }
}

/// One row of the accounts table, without the credential hash.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub created_at: Option<DateTime<Utc>>,
}

impl Account {
    pub fn from_row(row: &Row) -> Result<Self, StorageError> {
        let role = row
            .get_string("role")?
            .parse()
            .unwrap_or(Role::Operator);
        Ok(Self {
            id: row.get_i64("id")?,
            username: row.get_string("username")?,
            email: row.get_string("email")?,
            role,
            created_at: row
                .get_opt_string("created_at")?
                .as_deref()
                .and_then(parse_timestamp),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("Operator".parse::<Role>().unwrap(), Role::Operator);
        assert!("manager".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_display_roundtrip() {
        assert_eq!(Role::Admin.to_string().parse::<Role>().unwrap(), Role::Admin);
        assert!(Role::Admin.is_admin());
        assert!(!Role::Operator.is_admin());
    }
}
