//! Organization settings - singleton branding and subscription record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::parse_timestamp;
use crate::store::{Row, StorageError};

/// Subscription tier. The trial tier caps the organization at one machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum SubscriptionPlan {
    #[default]
    Trial,
    Paid,
}

impl std::fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubscriptionPlan::Trial => write!(f, "trial"),
            SubscriptionPlan::Paid => write!(f, "paid"),
        }
    }
}

impl std::str::FromStr for SubscriptionPlan {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trial" => Ok(SubscriptionPlan::Trial),
            "paid" => Ok(SubscriptionPlan::Paid),
            _ => Err(format!("Unknown subscription plan: {}", s)),
        }
    }
}

/// The single row of the organization_settings table.
#[derive(Debug, Clone, Serialize)]
pub struct OrganizationSettings {
    pub id: i64,
    pub company_name: Option<String>,
    pub logo_url: Option<String>,
    pub plant_no: Option<String>,
    pub address: Option<String>,
    pub subscription_plan: SubscriptionPlan,
    pub trial_ends_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl OrganizationSettings {
    pub fn from_row(row: &Row) -> Result<Self, StorageError> {
        let subscription_plan = row
            .get_opt_string("subscription_plan")?
            .as_deref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();
        Ok(Self {
            id: row.get_i64("id")?,
            company_name: row.get_opt_string("company_name")?,
            logo_url: row.get_opt_string("logo_url")?,
            plant_no: row.get_opt_string("plant_no")?,
            address: row.get_opt_string("address")?,
            subscription_plan,
            trial_ends_at: row
                .get_opt_string("trial_ends_at")?
                .as_deref()
                .and_then(parse_timestamp),
            updated_at: row
                .get_opt_string("updated_at")?
                .as_deref()
                .and_then(parse_timestamp),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_parsing() {
        assert_eq!(
            "trial".parse::<SubscriptionPlan>().unwrap(),
            SubscriptionPlan::Trial
        );
        assert_eq!(
            "PAID".parse::<SubscriptionPlan>().unwrap(),
            SubscriptionPlan::Paid
        );
        assert!("premium".parse::<SubscriptionPlan>().is_err());
    }

    #[test]
    fn test_unknown_plan_defaults_to_trial() {
        let mut row = Row::new();
        row.insert("id", crate::store::SqlValue::Integer(1));
        row.insert("company_name", crate::store::SqlValue::Null);
        row.insert("logo_url", crate::store::SqlValue::Null);
        row.insert("plant_no", crate::store::SqlValue::Null);
        row.insert("address", crate::store::SqlValue::Null);
        row.insert("subscription_plan", crate::store::SqlValue::Null);
        row.insert("trial_ends_at", crate::store::SqlValue::Null);
        row.insert("updated_at", crate::store::SqlValue::Null);

        let settings = OrganizationSettings::from_row(&row).unwrap();
        assert_eq!(settings.subscription_plan, SubscriptionPlan::Trial);
    }
}
