//! Shared type definitions for the Crowdwatch occupancy service.
//!
//! This crate is the single source of truth for the entities every other
//! crate passes around. Types flow downstream to `TypeScript` via `ts-rs`
//! for the dashboard.
//!
//! # Modules
//!
//! - [`ids`] -- Integer ID wrappers for locations, logs, and alerts
//! - [`enums`] -- Location status, log action, alert type
//! - [`structs`] -- Location, log entry, alert, and seed records

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{AlertType, LocationStatus, LogAction};
pub use ids::{AlertId, LocationId, LogId};
pub use structs::{Alert, Location, LocationSeed, LogEntry};
