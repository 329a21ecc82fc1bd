//! Error types for the `crowdwatch-decision` crate.
//!
//! The decision rules themselves are total functions. Only building a
//! [`DecisionEngine`](crate::DecisionEngine) from configuration can fail.

/// Errors raised while validating decision-engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecisionError {
    /// The warning threshold is outside `1..=100` percent.
    #[error("warning threshold must be between 1 and 100 percent, got {0}")]
    InvalidThreshold(u32),

    /// A reroute map key does not name a known location.
    #[error("reroute map has an entry for unknown location '{0}'")]
    UnknownSource(String),

    /// A reroute candidate does not name a known location.
    #[error("reroute candidate '{candidate}' for '{source_name}' is not a known location")]
    UnknownCandidate {
        /// The location whose candidate list is invalid.
        source_name: String,
        /// The unknown candidate.
        candidate: String,
    },

    /// A location lists itself as its own reroute target.
    #[error("location '{0}' lists itself as a reroute candidate")]
    SelfReroute(String),

    /// A location has an empty candidate list.
    #[error("location '{0}' has no reroute candidates")]
    EmptyCandidates(String),
}
