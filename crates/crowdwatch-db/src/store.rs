//! The occupancy store contract.
//!
//! [`OccupancyStore`] is the seam between the event processor and
//! persistence. Reads return committed snapshots. The only way to change
//! anything is [`OccupancyStore::transact`], which hands the caller every
//! location row under exclusive access together with a [`Journal`] for
//! the log and alert records the change produces, and commits all of it
//! or none of it.
//!
//! Exclusion covers all locations, not just the one being touched: an
//! entry that closes a location reads every other location's headroom to
//! pick a reroute target, so the whole table is the consistency unit.

use std::future::Future;

use chrono::{DateTime, Utc};
use crowdwatch_types::{Alert, AlertType, Location, LocationId, LocationSeed, LogAction, LogEntry};

use crate::error::DbError;

/// Persistence for locations, movement logs, and alerts.
///
/// Implementations must make [`transact`](Self::transact) atomic and
/// mutually exclusive with every other `transact` call.
pub trait OccupancyStore: Send + Sync + 'static {
    /// Insert each seed whose name is not yet present; existing rows keep
    /// their counts. Returns every location ordered by ID.
    fn seed(
        &self,
        seeds: &[LocationSeed],
    ) -> impl Future<Output = Result<Vec<Location>, DbError>> + Send;

    /// Every location, ordered by ID.
    fn locations(&self) -> impl Future<Output = Result<Vec<Location>, DbError>> + Send;

    /// A single location by ID.
    fn location(
        &self,
        id: LocationId,
    ) -> impl Future<Output = Result<Option<Location>, DbError>> + Send;

    /// Up to `limit` log entries, newest first, optionally for one location.
    fn recent_logs(
        &self,
        location: Option<LocationId>,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<LogEntry>, DbError>> + Send;

    /// Up to `limit` alerts, newest first.
    fn recent_alerts(&self, limit: usize)
    -> impl Future<Output = Result<Vec<Alert>, DbError>> + Send;

    /// Run `f` against every location row under exclusive access.
    ///
    /// On `Ok`, every modified location and every record added to the
    /// journal is committed together. On `Err`, nothing is written and the
    /// error is returned unchanged.
    fn transact<R, E, F>(&self, f: F) -> impl Future<Output = Result<R, E>> + Send
    where
        F: FnOnce(&mut [Location], &mut Journal) -> Result<R, E> + Send,
        R: Send,
        E: From<DbError> + Send;
}

// ---------------------------------------------------------------------------
// Journal
// ---------------------------------------------------------------------------

/// A log entry waiting for its ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDraft {
    /// The location the movement happened at.
    pub location_id: LocationId,
    /// Enter or exit.
    pub action: LogAction,
    /// When the movement was recorded.
    pub timestamp: DateTime<Utc>,
}

impl LogDraft {
    /// Attach a store-assigned ID.
    pub const fn into_entry(self, id: crowdwatch_types::LogId) -> LogEntry {
        LogEntry {
            id,
            location_id: self.location_id,
            action: self.action,
            timestamp: self.timestamp,
        }
    }
}

/// An alert waiting for its ID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertDraft {
    /// The location the alert is about.
    pub location_id: LocationId,
    /// Generated text.
    pub message: String,
    /// Alert kind.
    pub alert_type: AlertType,
    /// Suggested alternative location, if any.
    pub reroute_suggestion: Option<String>,
    /// When the alert was raised.
    pub timestamp: DateTime<Utc>,
}

impl AlertDraft {
    /// Attach a store-assigned ID.
    pub fn into_alert(self, id: crowdwatch_types::AlertId) -> Alert {
        Alert {
            id,
            location_id: self.location_id,
            message: self.message,
            alert_type: self.alert_type,
            reroute_suggestion: self.reroute_suggestion,
            timestamp: self.timestamp,
        }
    }
}

/// Append-only records produced inside one [`OccupancyStore::transact`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Journal {
    logs: Vec<LogDraft>,
    alerts: Vec<AlertDraft>,
}

impl Journal {
    /// Create an empty journal.
    pub const fn new() -> Self {
        Self {
            logs: Vec::new(),
            alerts: Vec::new(),
        }
    }

    /// Record a movement.
    pub fn log(&mut self, location_id: LocationId, action: LogAction, timestamp: DateTime<Utc>) {
        self.logs.push(LogDraft {
            location_id,
            action,
            timestamp,
        });
    }

    /// Record an alert.
    pub fn alert(&mut self, draft: AlertDraft) {
        self.alerts.push(draft);
    }

    /// Movements recorded so far.
    pub fn logs(&self) -> &[LogDraft] {
        &self.logs
    }

    /// Alerts recorded so far.
    pub fn alerts(&self) -> &[AlertDraft] {
        &self.alerts
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.logs.is_empty() && self.alerts.is_empty()
    }

    /// Split into the recorded logs and alerts.
    pub fn into_parts(self) -> (Vec<LogDraft>, Vec<AlertDraft>) {
        (self.logs, self.alerts)
    }
}
