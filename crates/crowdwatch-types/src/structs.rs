//! Core entity structs: locations, movement logs, and alerts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::{AlertType, LocationStatus, LogAction};
use crate::ids::{AlertId, LocationId, LogId};

// ---------------------------------------------------------------------------
// Location
// ---------------------------------------------------------------------------

/// A monitored physical space with a fixed capacity.
///
/// `status` and `entry_closed` are cached projections of
/// `(current_count, capacity)`. Every mutation recomputes both in the
/// same step as the count change; see `crowdwatch_core::transition`.
///
/// Invariant: `current_count <= capacity + 1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Location {
    /// Store-assigned identifier.
    pub id: LocationId,
    /// Unique human-readable name (also the key in the reroute map).
    pub name: String,
    /// Maximum number of people the location is rated for.
    pub capacity: u32,
    /// People currently inside.
    pub current_count: u32,
    /// Derived load classification.
    pub status: LocationStatus,
    /// Whether new entries are currently refused.
    pub entry_closed: bool,
    /// When the row was first created.
    pub created_at: DateTime<Utc>,
    /// When the row was last mutated.
    pub updated_at: DateTime<Utc>,
}

impl Location {
    /// Absolute ceiling for `current_count`: one person of grace over capacity.
    pub const fn hard_limit(&self) -> u32 {
        self.capacity.saturating_add(1)
    }

    /// Remaining room before capacity, floored at zero.
    pub const fn available_capacity(&self) -> u32 {
        self.capacity.saturating_sub(self.current_count)
    }

    /// Signed headroom (`capacity - current_count`), negative when overloaded.
    pub fn headroom(&self) -> i64 {
        i64::from(self.capacity).saturating_sub(i64::from(self.current_count))
    }

    /// Whether the count is strictly above capacity.
    pub const fn is_overloaded(&self) -> bool {
        self.current_count > self.capacity
    }
}

/// Startup seed for one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationSeed {
    /// Unique location name.
    pub name: String,
    /// Rated capacity (must be positive).
    pub capacity: u32,
}

impl LocationSeed {
    /// Build a seed entry.
    pub fn new(name: &str, capacity: u32) -> Self {
        Self {
            name: name.to_owned(),
            capacity,
        }
    }
}

// ---------------------------------------------------------------------------
// Log entry
// ---------------------------------------------------------------------------

/// Immutable record of a single enter or exit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct LogEntry {
    /// Store-assigned identifier.
    pub id: LogId,
    /// The location the movement happened at.
    pub location_id: LocationId,
    /// Enter or exit.
    pub action: LogAction,
    /// When the movement was recorded.
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Alert
// ---------------------------------------------------------------------------

/// Immutable record of an overload notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Alert {
    /// Store-assigned identifier.
    pub id: AlertId,
    /// The location the alert is about.
    pub location_id: LocationId,
    /// Generated human-readable text.
    pub message: String,
    /// Alert kind.
    pub alert_type: AlertType,
    /// Name of a nearby location with spare room, if one qualified.
    pub reroute_suggestion: Option<String>,
    /// When the alert was raised.
    pub timestamp: DateTime<Utc>,
}
