//! Enumeration types for the Crowdwatch occupancy service.
//!
//! Each enum has a fixed wire spelling used by both the JSON API and the
//! database columns. [`as_db`](LocationStatus::as_db) and
//! [`from_db`](LocationStatus::from_db) convert to and from the stored
//! text form.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

// ---------------------------------------------------------------------------
// Location status
// ---------------------------------------------------------------------------

/// Load classification of a location.
///
/// Always derived from `(current_count, capacity)`; never set directly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(rename_all = "UPPERCASE")]
#[ts(export, export_to = "bindings/")]
pub enum LocationStatus {
    /// Below the warning threshold.
    #[default]
    Normal,
    /// At or above the warning threshold, not over capacity.
    Warning,
    /// Strictly over capacity.
    Critical,
}

impl LocationStatus {
    /// Stored text form.
    pub const fn as_db(self) -> &'static str {
        match self {
            Self::Normal => "NORMAL",
            Self::Warning => "WARNING",
            Self::Critical => "CRITICAL",
        }
    }

    /// Parse the stored text form.
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "NORMAL" => Some(Self::Normal),
            "WARNING" => Some(Self::Warning),
            "CRITICAL" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl core::fmt::Display for LocationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_db())
    }
}

// ---------------------------------------------------------------------------
// Log action
// ---------------------------------------------------------------------------

/// Direction of a recorded movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum LogAction {
    /// A person entered the location.
    Enter,
    /// A person left the location.
    Exit,
}

impl LogAction {
    /// Stored text form.
    pub const fn as_db(self) -> &'static str {
        match self {
            Self::Enter => "enter",
            Self::Exit => "exit",
        }
    }

    /// Parse the stored text form.
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "enter" => Some(Self::Enter),
            "exit" => Some(Self::Exit),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Alert type
// ---------------------------------------------------------------------------

/// Kind of alert raised by the event processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings/")]
pub enum AlertType {
    /// Location is approaching its limit.
    Warning,
    /// Location went over capacity and entry was closed.
    Critical,
    /// Visitors are being redirected elsewhere.
    Reroute,
}

impl AlertType {
    /// Stored text form.
    pub const fn as_db(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Critical => "critical",
            Self::Reroute => "reroute",
        }
    }

    /// Parse the stored text form.
    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "warning" => Some(Self::Warning),
            "critical" => Some(Self::Critical),
            "reroute" => Some(Self::Reroute),
            _ => None,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_form_is_uppercase() {
        let json = serde_json::to_string(&LocationStatus::Warning).unwrap();
        assert_eq!(json, "\"WARNING\"");
        assert_eq!(LocationStatus::from_db("CRITICAL"), Some(LocationStatus::Critical));
        assert_eq!(LocationStatus::from_db("critical"), None);
    }

    #[test]
    fn db_forms_match_serde_forms() {
        for action in [LogAction::Enter, LogAction::Exit] {
            let json = serde_json::to_string(&action).unwrap();
            assert_eq!(json, format!("\"{}\"", action.as_db()));
            assert_eq!(LogAction::from_db(action.as_db()), Some(action));
        }
        for kind in [AlertType::Warning, AlertType::Critical, AlertType::Reroute] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_db()));
            assert_eq!(AlertType::from_db(kind.as_db()), Some(kind));
        }
    }
}
