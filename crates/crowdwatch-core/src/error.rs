//! Error types for the event processor and query surface.
//!
//! Rejected entries are not errors; they come back as
//! [`EnterOutcome`](crate::EnterOutcome) variants. Only an unknown
//! location and a failing store reach this type.

use crowdwatch_db::DbError;
use crowdwatch_types::LocationId;

/// Errors that can occur while processing an occupancy event or query.
#[derive(Debug, thiserror::Error)]
pub enum OccupancyError {
    /// No location has the requested ID.
    #[error("location {0} not found")]
    NotFound(LocationId),

    /// The store of record failed.
    #[error("store error: {0}")]
    Store(#[from] DbError),
}
