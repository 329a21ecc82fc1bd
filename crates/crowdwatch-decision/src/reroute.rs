//! Reroute adjacency map and best-target selection.
//!
//! The adjacency map is a fixed directed graph over the known location
//! names: each location maps to an ordered list of nearby candidates.
//! It is configuration, loaded once at startup and validated against the
//! seeded location set, then handed to the engine by value.

use std::collections::{BTreeMap, BTreeSet};

use crowdwatch_types::Location;
use serde::{Deserialize, Serialize};

use crate::error::DecisionError;

/// Location name -> ordered reroute candidates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RerouteMap {
    routes: BTreeMap<String, Vec<String>>,
}

impl RerouteMap {
    /// Build a map from `(location, candidates)` pairs.
    pub fn new<I, S>(routes: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<S>)>,
        S: Into<String>,
    {
        Self {
            routes: routes
                .into_iter()
                .map(|(from, to)| (from.into(), to.into_iter().map(Into::into).collect()))
                .collect(),
        }
    }

    /// The default campus topology.
    pub fn campus() -> Self {
        Self::new([
            ("Cafeteria", vec!["Admin Block", "Academic Block"]),
            ("Admin Block", vec!["Academic Block", "Basketball Court"]),
            ("Academic Block", vec!["Admin Block", "Basketball Court"]),
            ("Basketball Court", vec!["Cafeteria", "Admin Block"]),
        ])
    }

    /// Ordered candidates for `location`, if it has an entry.
    pub fn candidates(&self, location: &str) -> Option<&[String]> {
        self.routes.get(location).map(Vec::as_slice)
    }

    /// Number of locations with an entry.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether the map has no entries.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Check every key and candidate against the known location names.
    ///
    /// A location may be absent from the map (it then never gets a
    /// suggestion), but every entry present must be non-empty, must not
    /// point at itself, and must only name known locations.
    pub fn validate<'a, I>(&self, known: I) -> Result<(), DecisionError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let known: BTreeSet<&str> = known.into_iter().collect();

        for (source, candidates) in &self.routes {
            if !known.contains(source.as_str()) {
                return Err(DecisionError::UnknownSource(source.clone()));
            }
            if candidates.is_empty() {
                return Err(DecisionError::EmptyCandidates(source.clone()));
            }
            for candidate in candidates {
                if candidate == source {
                    return Err(DecisionError::SelfReroute(source.clone()));
                }
                if !known.contains(candidate.as_str()) {
                    return Err(DecisionError::UnknownCandidate {
                        source_name: source.clone(),
                        candidate: candidate.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Pick the candidate with the strictly greatest positive headroom.
    ///
    /// Candidates missing from `availability` are skipped. Ties go to
    /// the candidate listed first. Returns `None` when `location` has no
    /// entry or no candidate has room.
    pub fn find_best(&self, location: &str, availability: &Availability) -> Option<&str> {
        let candidates = self.candidates(location)?;

        let mut best: Option<(&str, i64)> = None;
        for candidate in candidates {
            let Some(available) = availability.get(candidate) else {
                continue;
            };
            if available <= 0 {
                continue;
            }
            if best.is_none_or(|(_, best_available)| available > best_available) {
                best = Some((candidate.as_str(), available));
            }
        }

        if best.is_none() {
            tracing::trace!(location, "no reroute candidate has spare capacity");
        }
        best.map(|(name, _)| name)
    }
}

/// Per-location headroom (`capacity - current_count`), keyed by name.
///
/// Values are signed: an overloaded location has negative headroom.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Availability {
    headroom: BTreeMap<String, i64>,
}

impl Availability {
    /// Build from the current state of every location.
    pub fn from_locations(locations: &[Location]) -> Self {
        Self {
            headroom: locations
                .iter()
                .map(|loc| (loc.name.clone(), loc.headroom()))
                .collect(),
        }
    }

    /// Headroom for a location name, if known.
    pub fn get(&self, name: &str) -> Option<i64> {
        self.headroom.get(name).copied()
    }
}

impl<S: Into<String>> FromIterator<(S, i64)> for Availability {
    fn from_iter<T: IntoIterator<Item = (S, i64)>>(iter: T) -> Self {
        Self {
            headroom: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
