//! Event processor and query surface for the Crowdwatch occupancy service.
//!
//! [`OccupancyService`] turns enter, exit, simulate, and reset requests
//! into atomic store transactions, running every count change through the
//! pure functions in [`transition`]. Its read side projects the store into
//! status, history, alert, forecast, and campus summary views.
//!
//! # Modules
//!
//! - [`config`] -- Typed `crowdwatch-config.yaml` loading and validation
//! - [`processor`] -- [`OccupancyService`] mutations
//! - [`transition`] -- Count changes with derived-field recomputation
//! - [`outcome`] -- Tagged enter/exit results and tick reports
//! - [`query`] -- Read-only projections
//! - [`summary`] -- Campus totals and recommendations
//! - [`error`] -- [`OccupancyError`]

pub mod config;
pub mod error;
pub mod outcome;
pub mod processor;
pub mod query;
pub mod summary;
pub mod transition;

pub use config::{ConfigError, ServiceConfig};
pub use error::OccupancyError;
pub use outcome::{EnterOutcome, EntryChange, ExitOutcome, RaisedAlert, TickChange, TickReport};
pub use processor::OccupancyService;
pub use query::{AlertView, Forecast, LocationView};
pub use summary::{CampusSummary, Recommendation, RecommendationLevel};
