//! Type-safe identifier wrappers around database row IDs.
//!
//! Locations, log entries, and alerts are keyed by integer IDs assigned
//! by the store (`BIGSERIAL` in `PostgreSQL`, a counter in the in-memory
//! store). Wrapping them prevents passing a log ID where a location ID is
//! expected. Clients address locations by the raw number
//! (`POST /enter?location_id=1`), so the wrappers serialize transparently.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Generates a newtype wrapper around `i64` with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[serde(transparent)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(#[ts(type = "number")] pub i64);

        impl $name {
            /// Wrap a raw row ID.
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            /// Return the inner row ID.
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a monitored location.
    LocationId
}

define_id! {
    /// Unique identifier for an enter/exit log entry.
    LogId
}

define_id! {
    /// Unique identifier for an alert.
    AlertId
}
