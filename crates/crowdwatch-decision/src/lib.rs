//! Pure decision rules for the Crowdwatch occupancy service.
//!
//! Nothing in this crate touches storage or the clock on its own. Every
//! function takes counts, capacities, names, and (where randomness is
//! involved) an explicit RNG, so each rule is testable in isolation.
//!
//! # Modules
//!
//! - [`status`] -- `NORMAL` / `WARNING` / `CRITICAL` classification and load percentage
//! - [`reroute`] -- Adjacency map and best-target selection
//! - [`message`] -- Alert text templates
//! - [`engine`] -- [`DecisionEngine`] binding the rules to startup configuration
//! - [`forecast`] -- Time-of-day forecast heuristic
//! - [`simulate`] -- Delta policy for randomized simulation ticks
//! - [`error`] -- Configuration validation errors

pub mod engine;
pub mod error;
pub mod forecast;
pub mod message;
pub mod reroute;
pub mod simulate;
pub mod status;

pub use engine::DecisionEngine;
pub use error::DecisionError;
pub use forecast::{ForecastPoint, base_load, forecast};
pub use reroute::{Availability, RerouteMap};
pub use status::{DEFAULT_WARNING_PERCENT, determine_status, load_percentage};
