//! Pure state transitions over location rows.
//!
//! These are the only functions that write `current_count`. Each one sets
//! the count and recomputes `status` and `entry_closed` in the same step,
//! so the cached fields can never drift from their derivation. They run
//! inside [`OccupancyStore::transact`](crowdwatch_db::OccupancyStore::transact)
//! and record their log and alert rows in its [`Journal`].

use chrono::{DateTime, Utc};
use crowdwatch_db::{AlertDraft, Journal};
use crowdwatch_decision::DecisionEngine;
use crowdwatch_decision::simulate::clamped_count;
use crowdwatch_types::{AlertType, Location, LocationId, LocationStatus, LogAction};

use crate::error::OccupancyError;
use crate::outcome::{EnterOutcome, EntryChange, ExitOutcome, RaisedAlert, TickChange, TickReport};

/// Gate movement produced by [`set_count`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    Steady,
    Closing,
    Reopening,
}

/// Set the count and recompute every derived field.
fn set_count(location: &mut Location, count: u32, engine: &DecisionEngine, now: DateTime<Utc>) -> Gate {
    let was_closed = location.entry_closed;
    location.current_count = count;
    location.status = engine.status(count, location.capacity);
    location.entry_closed = location.is_overloaded();
    location.updated_at = now;

    match (was_closed, location.entry_closed) {
        (false, true) => Gate::Closing,
        (true, false) => Gate::Reopening,
        _ => Gate::Steady,
    }
}

/// Journal a critical alert for the location at `index`, which has just
/// crossed into overload, and return the reroute target.
fn raise_overload_alert(
    locations: &[Location],
    index: usize,
    engine: &DecisionEngine,
    journal: &mut Journal,
    now: DateTime<Utc>,
) -> Option<RaisedAlert> {
    let location = locations.get(index)?;
    let reroute = engine.reroute_from(&location.name, locations);
    let message = engine.alert_message(
        &location.name,
        location.current_count,
        location.capacity,
        reroute.as_deref(),
    );
    journal.alert(AlertDraft {
        location_id: location.id,
        message: message.clone(),
        alert_type: AlertType::Critical,
        reroute_suggestion: reroute.clone(),
        timestamp: now,
    });
    Some(RaisedAlert {
        location: location.name.clone(),
        message,
        reroute_suggestion: reroute,
    })
}

fn position(locations: &[Location], id: LocationId) -> Result<usize, OccupancyError> {
    locations
        .iter()
        .position(|location| location.id == id)
        .ok_or(OccupancyError::NotFound(id))
}

/// Admit one person to location `id`, unless it is at its hard limit or
/// its entry is closed.
pub fn enter(
    locations: &mut [Location],
    id: LocationId,
    engine: &DecisionEngine,
    journal: &mut Journal,
    now: DateTime<Utc>,
) -> Result<EnterOutcome, OccupancyError> {
    let index = position(locations, id)?;
    let Some(location) = locations.get_mut(index) else {
        return Err(OccupancyError::NotFound(id));
    };

    if location.current_count >= location.hard_limit() {
        let location = location.clone();
        let reroute = engine.reroute_from(&location.name, locations);
        return Ok(EnterOutcome::RejectedPhysicalLimit { location, reroute });
    }
    if location.entry_closed {
        let location = location.clone();
        let reroute = engine.reroute_from(&location.name, locations);
        return Ok(EnterOutcome::RejectedEntryClosed { location, reroute });
    }

    let count = location.current_count.saturating_add(1);
    let gate = set_count(location, count, engine, now);
    journal.log(id, LogAction::Enter, now);

    let entry = match gate {
        Gate::Closing => EntryChange::Closed {
            reroute: raise_overload_alert(locations, index, engine, journal, now)
                .and_then(|alert| alert.reroute_suggestion),
        },
        Gate::Reopening => EntryChange::Reopened,
        Gate::Steady => EntryChange::Unchanged,
    };
    let location = locations
        .get(index)
        .cloned()
        .ok_or(OccupancyError::NotFound(id))?;
    Ok(EnterOutcome::Accepted { location, entry })
}

/// Record one person leaving location `id`. The count floors at zero and
/// the exit is logged either way.
pub fn exit(
    locations: &mut [Location],
    id: LocationId,
    engine: &DecisionEngine,
    journal: &mut Journal,
    now: DateTime<Utc>,
) -> Result<ExitOutcome, OccupancyError> {
    let index = position(locations, id)?;
    let Some(location) = locations.get_mut(index) else {
        return Err(OccupancyError::NotFound(id));
    };

    let count = location.current_count.saturating_sub(1);
    let gate = set_count(location, count, engine, now);
    journal.log(id, LogAction::Exit, now);

    let entry = match gate {
        Gate::Reopening => EntryChange::Reopened,
        // Exits never raise the count.
        Gate::Closing | Gate::Steady => EntryChange::Unchanged,
    };
    Ok(ExitOutcome {
        location: location.clone(),
        entry,
    })
}

/// Apply a simulated `delta` to the location at `index`.
///
/// A zero delta leaves the row untouched. Otherwise the count is clamped
/// to `[0, capacity + 1]` and the change (plus any alert) is added to
/// `report`.
pub fn apply_delta(
    locations: &mut [Location],
    index: usize,
    delta: i64,
    engine: &DecisionEngine,
    journal: &mut Journal,
    report: &mut TickReport,
    now: DateTime<Utc>,
) {
    if delta == 0 {
        return;
    }
    let Some(location) = locations.get_mut(index) else {
        return;
    };

    let count = clamped_count(location, delta);
    let gate = set_count(location, count, engine, now);
    report.changes.push(TickChange {
        location: location.name.clone(),
        change: delta,
        new_count: count,
    });

    if gate == Gate::Closing {
        report
            .alerts
            .extend(raise_overload_alert(locations, index, engine, journal, now));
    }
}

/// Zero a location. Returns whether anything changed.
pub fn reset(location: &mut Location, now: DateTime<Utc>) -> bool {
    let changed = location.current_count != 0
        || location.status != LocationStatus::Normal
        || location.entry_closed;
    if changed {
        location.current_count = 0;
        location.status = LocationStatus::Normal;
        location.entry_closed = false;
        location.updated_at = now;
    }
    changed
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use super::*;

    fn campus() -> Vec<Location> {
        let now = Utc::now();
        [
            ("Cafeteria", 30),
            ("Admin Block", 50),
            ("Academic Block", 150),
            ("Basketball Court", 20),
        ]
        .into_iter()
        .zip(1..)
        .map(|((name, capacity), id)| Location {
            id: LocationId::new(id),
            name: name.to_owned(),
            capacity,
            current_count: 0,
            status: LocationStatus::Normal,
            entry_closed: false,
            created_at: now,
            updated_at: now,
        })
        .collect()
    }

    fn with_count(mut locations: Vec<Location>, index: usize, count: u32) -> Vec<Location> {
        let engine = DecisionEngine::campus();
        set_count(&mut locations[index], count, &engine, Utc::now());
        locations
    }

    fn assert_consistent(location: &Location, engine: &DecisionEngine) {
        assert!(location.current_count <= location.hard_limit());
        assert_eq!(
            location.status,
            engine.status(location.current_count, location.capacity)
        );
        assert_eq!(location.entry_closed, location.is_overloaded());
    }

    #[test]
    fn enter_to_capacity_is_warning_and_open() {
        let engine = DecisionEngine::campus();
        let mut locations = with_count(campus(), 0, 29);
        let mut journal = Journal::new();

        let outcome = enter(&mut locations, LocationId::new(1), &engine, &mut journal, Utc::now()).unwrap();

        let EnterOutcome::Accepted { location, entry } = outcome else {
            panic!("expected acceptance, got {outcome:?}");
        };
        assert_eq!(location.current_count, 30);
        assert_eq!(location.status, LocationStatus::Warning);
        assert!(!location.entry_closed);
        assert_eq!(entry, EntryChange::Unchanged);
        assert_eq!(journal.logs().len(), 1);
        assert!(journal.alerts().is_empty());
    }

    #[test]
    fn enter_over_capacity_closes_and_alerts() {
        let engine = DecisionEngine::campus();
        let mut locations = with_count(campus(), 0, 30);
        locations = with_count(locations, 1, 45);
        let mut journal = Journal::new();

        let outcome = enter(&mut locations, LocationId::new(1), &engine, &mut journal, Utc::now()).unwrap();

        let EnterOutcome::Accepted { location, entry } = outcome else {
            panic!("expected acceptance, got {outcome:?}");
        };
        assert_eq!(location.current_count, 31);
        assert_eq!(location.status, LocationStatus::Critical);
        assert!(location.entry_closed);
        // Admin Block has 5 free, Academic Block 150.
        assert_eq!(
            entry,
            EntryChange::Closed {
                reroute: Some(String::from("Academic Block"))
            }
        );

        let alerts = journal.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::Critical);
        assert_eq!(alerts[0].reroute_suggestion.as_deref(), Some("Academic Block"));
        assert!(alerts[0].message.contains("Cafeteria"));
        assert!(alerts[0].message.contains("31/30"));
        assert_eq!(journal.logs()[0].action, LogAction::Enter);
    }

    #[test]
    fn hard_limit_rejects_without_records() {
        let engine = DecisionEngine::campus();
        let mut locations = with_count(campus(), 0, 31);
        let before = locations.clone();
        let mut journal = Journal::new();

        let outcome = enter(&mut locations, LocationId::new(1), &engine, &mut journal, Utc::now()).unwrap();

        // 31 is also the hard limit for capacity 30.
        assert!(matches!(outcome, EnterOutcome::RejectedPhysicalLimit { .. }));
        assert_eq!(outcome.reroute(), Some("Academic Block"));
        assert_eq!(locations, before);
        assert!(journal.is_empty());
    }

    #[test]
    fn entry_closed_below_hard_limit_suggests_reroute() {
        let engine = DecisionEngine::campus();
        let mut locations = campus();
        // A closed gate below the hard limit only arises from a stale row;
        // the rejection must still hold and report a target.
        locations[0].current_count = 30;
        locations[0].entry_closed = true;
        let mut journal = Journal::new();

        let outcome = enter(&mut locations, LocationId::new(1), &engine, &mut journal, Utc::now()).unwrap();

        let EnterOutcome::RejectedEntryClosed { location, reroute } = &outcome else {
            panic!("expected entry-closed rejection, got {outcome:?}");
        };
        assert_eq!(location.current_count, 30);
        assert_eq!(reroute.as_deref(), Some("Academic Block"));
        assert!(outcome.rejection_message().unwrap().contains("currently closed"));
        assert!(journal.is_empty());
    }

    #[test]
    fn exit_at_overload_reopens_as_warning() {
        let engine = DecisionEngine::campus();
        let mut locations = with_count(campus(), 0, 31);
        assert!(locations[0].entry_closed);
        let mut journal = Journal::new();

        let outcome = exit(&mut locations, LocationId::new(1), &engine, &mut journal, Utc::now()).unwrap();

        assert_eq!(outcome.location.current_count, 30);
        assert_eq!(outcome.location.status, LocationStatus::Warning);
        assert!(!outcome.location.entry_closed);
        assert_eq!(outcome.entry, EntryChange::Reopened);
        assert_eq!(journal.logs()[0].action, LogAction::Exit);
    }

    #[test]
    fn exit_from_empty_floors_at_zero_and_logs() {
        let engine = DecisionEngine::campus();
        let mut locations = campus();
        let mut journal = Journal::new();

        let outcome = exit(&mut locations, LocationId::new(4), &engine, &mut journal, Utc::now()).unwrap();

        assert_eq!(outcome.location.current_count, 0);
        assert_eq!(journal.logs().len(), 1);
    }

    #[test]
    fn enter_then_exit_restores_count() {
        let engine = DecisionEngine::campus();
        let mut locations = with_count(campus(), 2, 17);
        let mut journal = Journal::new();

        enter(&mut locations, LocationId::new(3), &engine, &mut journal, Utc::now()).unwrap();
        exit(&mut locations, LocationId::new(3), &engine, &mut journal, Utc::now()).unwrap();

        assert_eq!(locations[2].current_count, 17);
        assert_consistent(&locations[2], &engine);
    }

    #[test]
    fn unknown_location_is_not_found() {
        let engine = DecisionEngine::campus();
        let mut locations = campus();
        let mut journal = Journal::new();

        let result = enter(&mut locations, LocationId::new(99), &engine, &mut journal, Utc::now());
        assert!(matches!(result, Err(OccupancyError::NotFound(id)) if id == LocationId::new(99)));
        let result = exit(&mut locations, LocationId::new(99), &engine, &mut journal, Utc::now());
        assert!(matches!(result, Err(OccupancyError::NotFound(_))));
    }

    #[test]
    fn delta_clamps_and_alerts_once_on_crossing() {
        let engine = DecisionEngine::campus();
        let mut locations = with_count(campus(), 3, 19);
        let mut journal = Journal::new();
        let mut report = TickReport::default();

        apply_delta(&mut locations, 3, 5, &engine, &mut journal, &mut report, Utc::now());
        assert_eq!(locations[3].current_count, 21);
        assert_consistent(&locations[3], &engine);
        assert_eq!(report.changes[0].change, 5);
        assert_eq!(report.changes[0].new_count, 21);
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(report.alerts[0].reroute_suggestion.as_deref(), Some("Admin Block"));

        // Already closed: no second alert.
        apply_delta(&mut locations, 3, 1, &engine, &mut journal, &mut report, Utc::now());
        assert_eq!(locations[3].current_count, 21);
        assert_eq!(report.alerts.len(), 1);
        assert_eq!(journal.alerts().len(), 1);
        assert!(journal.logs().is_empty());
    }

    #[test]
    fn zero_delta_is_skipped() {
        let engine = DecisionEngine::campus();
        let mut locations = campus();
        let before = locations.clone();
        let mut journal = Journal::new();
        let mut report = TickReport::default();

        apply_delta(&mut locations, 0, 0, &engine, &mut journal, &mut report, Utc::now());
        assert_eq!(locations, before);
        assert!(report.changes.is_empty());
    }

    #[test]
    fn negative_delta_reopens_and_floors() {
        let engine = DecisionEngine::campus();
        let mut locations = with_count(campus(), 3, 21);
        let mut journal = Journal::new();
        let mut report = TickReport::default();

        apply_delta(&mut locations, 3, -3, &engine, &mut journal, &mut report, Utc::now());
        assert_eq!(locations[3].current_count, 18);
        assert!(!locations[3].entry_closed);
        assert_consistent(&locations[3], &engine);

        apply_delta(&mut locations, 3, -30, &engine, &mut journal, &mut report, Utc::now());
        assert_eq!(locations[3].current_count, 0);
    }

    #[test]
    fn reset_is_idempotent() {
        let mut locations = with_count(campus(), 0, 31);
        let first = Utc::now();
        assert!(reset(&mut locations[0], first));
        let once = locations.clone();
        assert!(!reset(&mut locations[0], Utc::now()));
        assert_eq!(locations, once);
        assert_eq!(locations[0].current_count, 0);
        assert_eq!(locations[0].status, LocationStatus::Normal);
        assert!(!locations[0].entry_closed);
    }
}
