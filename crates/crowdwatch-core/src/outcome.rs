//! Results of mutating operations.
//!
//! A refused entry is an expected business outcome, so it is a variant
//! here rather than an [`OccupancyError`](crate::OccupancyError). Callers
//! match exhaustively instead of inspecting a success flag.

use crowdwatch_types::Location;
use serde::Serialize;

/// How an operation changed a location's entry gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryChange {
    /// The gate stayed as it was.
    Unchanged,
    /// The location went over capacity and entry closed. Carries the
    /// reroute target written to the alert, if one qualified.
    Closed {
        /// Suggested alternative location.
        reroute: Option<String>,
    },
    /// The location dropped back to capacity and entry reopened.
    Reopened,
}

/// Result of an enter event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnterOutcome {
    /// The person was admitted.
    Accepted {
        /// The location after the increment.
        location: Location,
        /// Gate change caused by this entry.
        entry: EntryChange,
    },
    /// The location is already at its hard limit; nothing changed.
    RejectedPhysicalLimit {
        /// The unchanged location.
        location: Location,
        /// Best nearby location with room, if any.
        reroute: Option<String>,
    },
    /// Entry is closed; nothing changed.
    RejectedEntryClosed {
        /// The unchanged location.
        location: Location,
        /// Best nearby location with room, if any.
        reroute: Option<String>,
    },
}

impl EnterOutcome {
    /// Whether the person was admitted.
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// The location as it stands after the event.
    pub const fn location(&self) -> &Location {
        match self {
            Self::Accepted { location, .. }
            | Self::RejectedPhysicalLimit { location, .. }
            | Self::RejectedEntryClosed { location, .. } => location,
        }
    }

    /// Suggested alternative for a rejection.
    pub fn reroute(&self) -> Option<&str> {
        match self {
            Self::Accepted { .. } => None,
            Self::RejectedPhysicalLimit { reroute, .. }
            | Self::RejectedEntryClosed { reroute, .. } => reroute.as_deref(),
        }
    }

    /// Explanation for a rejection.
    pub fn rejection_message(&self) -> Option<String> {
        match self {
            Self::Accepted { .. } => None,
            Self::RejectedPhysicalLimit { location, .. } => Some(format!(
                "Physical limit reached for {}. Cannot add more people.",
                location.name
            )),
            Self::RejectedEntryClosed { location, .. } => Some(format!(
                "Entry to {} is currently closed due to high crowd density.",
                location.name
            )),
        }
    }
}

/// Result of an exit event. Exits always succeed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitOutcome {
    /// The location after the decrement.
    pub location: Location,
    /// Gate change caused by this exit.
    pub entry: EntryChange,
}

/// One location's movement during a simulation tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickChange {
    /// Location name.
    pub location: String,
    /// Drawn delta, before clamping.
    pub change: i64,
    /// Count after clamping to `[0, capacity + 1]`.
    pub new_count: u32,
}

/// An alert raised during a simulation tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RaisedAlert {
    /// Location name.
    pub location: String,
    /// Generated alert text.
    pub message: String,
    /// Suggested alternative location.
    pub reroute_suggestion: Option<String>,
}

/// Everything one simulation tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    /// Locations whose drawn delta was non-zero, in ID order.
    pub changes: Vec<TickChange>,
    /// Alerts raised by locations crossing into overload.
    pub alerts: Vec<RaisedAlert>,
}
