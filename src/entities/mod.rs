//! Entity types - typed views of the five persisted tables

pub mod account;
pub mod audit;
pub mod checklist;
pub mod machine;
pub mod organization;

pub use account::{Account, Role};
pub use audit::{AuditAction, AuditEntry};
pub use checklist::{Checklist, ChecklistSummary, EditSnapshot, Shift};
pub use machine::Machine;
pub use organization::{OrganizationSettings, SubscriptionPlan};

use chrono::{DateTime, SecondsFormat, Utc};

/// Serialize a timestamp the way every table stores it: RFC 3339 UTC with
/// whole-second precision, so lexicographic order is chronological order.
pub fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Parse a stored timestamp back; tolerant of the offset spelling.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_roundtrip() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        let text = format_timestamp(ts);
        assert_eq!(text, "2025-03-14T09:26:53Z");
        assert_eq!(parse_timestamp(&text), Some(ts));
    }

    #[test]
    fn test_timestamp_order_is_lexicographic() {
        let earlier = Utc.with_ymd_and_hms(2025, 3, 14, 9, 0, 0).unwrap();
        let later = Utc.with_ymd_and_hms(2025, 3, 14, 10, 0, 0).unwrap();
        assert!(format_timestamp(earlier) < format_timestamp(later));
    }
}
