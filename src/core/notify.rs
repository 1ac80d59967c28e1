//! Notification seam for external observers
//!
//! The lifecycle engine publishes "new checklist" and "checklist updated"
//! events through this trait. Live deployments hang a websocket/queue
//! bridge on it; the CLI and tests use the no-op.

use crate::entities::Checklist;

pub trait Notifier: Sync {
    fn checklist_created(&self, _checklist: &Checklist) {}

    fn checklist_updated(&self, _checklist_id: i64) {}
}

/// Observer that drops every event.
#[derive(Debug, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {}
