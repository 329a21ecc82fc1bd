//! The [`DecisionEngine`]: immutable decision configuration plus the
//! pure rules that read it.
//!
//! Built once at startup from the validated reroute map and warning
//! threshold, then shared behind an `Arc`. It never touches storage; the
//! event processor feeds it counts and capacities and persists whatever
//! it decides.

use crowdwatch_types::{Location, LocationStatus};

use crate::error::DecisionError;
use crate::message::alert_message;
use crate::reroute::{Availability, RerouteMap};
use crate::status::{DEFAULT_WARNING_PERCENT, determine_status, load_percentage};

/// Decision rules bound to a reroute topology and warning threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionEngine {
    reroute: RerouteMap,
    warning_percent: u32,
}

impl DecisionEngine {
    /// Build an engine, rejecting a threshold outside `1..=100`.
    ///
    /// The reroute map should already have been validated against the
    /// seeded locations with [`RerouteMap::validate`].
    pub fn new(reroute: RerouteMap, warning_percent: u32) -> Result<Self, DecisionError> {
        if !(1..=100).contains(&warning_percent) {
            return Err(DecisionError::InvalidThreshold(warning_percent));
        }
        Ok(Self {
            reroute,
            warning_percent,
        })
    }

    /// The default campus topology with an 80% warning threshold.
    pub fn campus() -> Self {
        Self {
            reroute: RerouteMap::campus(),
            warning_percent: DEFAULT_WARNING_PERCENT,
        }
    }

    /// The configured warning threshold in percent.
    pub const fn warning_percent(&self) -> u32 {
        self.warning_percent
    }

    /// Status for a count/capacity pair.
    pub fn status(&self, count: u32, capacity: u32) -> LocationStatus {
        determine_status(count, capacity, self.warning_percent)
    }

    /// Load percentage for a count/capacity pair.
    pub fn load_percentage(&self, count: u32, capacity: u32) -> f64 {
        load_percentage(count, capacity)
    }

    /// Best reroute target for `location` given current availability.
    pub fn find_best_reroute(&self, location: &str, availability: &Availability) -> Option<String> {
        self.reroute
            .find_best(location, availability)
            .map(str::to_owned)
    }

    /// Best reroute target for `location_name` computed from the current
    /// state of every location.
    pub fn reroute_from(&self, location_name: &str, locations: &[Location]) -> Option<String> {
        let availability = Availability::from_locations(locations);
        self.find_best_reroute(location_name, &availability)
    }

    /// Alert text for a location's current load.
    pub fn alert_message(
        &self,
        location: &str,
        count: u32,
        capacity: u32,
        reroute: Option<&str>,
    ) -> String {
        alert_message(location, count, capacity, self.warning_percent, reroute)
    }
}

impl Default for DecisionEngine {
    fn default() -> Self {
        Self::campus()
    }
}
