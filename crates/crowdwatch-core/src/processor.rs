//! The event processor.
//!
//! [`OccupancyService`] owns the store and the decision engine. Every
//! mutating operation runs as exactly one
//! [`OccupancyStore::transact`] call, so the read of current state, the
//! transition, and the write of the new rows plus their log and alert
//! records are atomic and never interleave with another writer. The clock
//! is read inside the transaction, so journal timestamps follow commit
//! order.

use std::sync::Arc;

use chrono::Utc;
use crowdwatch_db::OccupancyStore;
use crowdwatch_decision::DecisionEngine;
use crowdwatch_decision::simulate::draw_delta;
use crowdwatch_types::LocationId;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{ForecastConfig, QueryConfig};
use crate::error::OccupancyError;
use crate::outcome::{EnterOutcome, EntryChange, ExitOutcome, TickReport};
use crate::transition;

/// Enter / exit / simulate / reset over a store of record.
#[derive(Debug)]
pub struct OccupancyService<S> {
    pub(crate) store: S,
    pub(crate) engine: Arc<DecisionEngine>,
    pub(crate) queries: QueryConfig,
    pub(crate) forecast: ForecastConfig,
}

impl<S: OccupancyStore> OccupancyService<S> {
    /// Create a service with default query and forecast settings.
    pub fn new(store: S, engine: Arc<DecisionEngine>) -> Self {
        Self {
            store,
            engine,
            queries: QueryConfig::default(),
            forecast: ForecastConfig::default(),
        }
    }

    /// Override the history and alert window sizes.
    #[must_use]
    pub const fn with_queries(mut self, queries: QueryConfig) -> Self {
        self.queries = queries;
        self
    }

    /// Override the forecast parameters.
    #[must_use]
    pub const fn with_forecast(mut self, forecast: ForecastConfig) -> Self {
        self.forecast = forecast;
        self
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// The decision engine.
    pub fn engine(&self) -> &DecisionEngine {
        &self.engine
    }

    /// Admit one person to `id`.
    ///
    /// Returns [`OccupancyError::NotFound`] for an unknown location. Hard
    /// limit and closed-entry refusals are [`EnterOutcome`] variants.
    pub async fn enter(&self, id: LocationId) -> Result<EnterOutcome, OccupancyError> {
        let engine = &*self.engine;
        let outcome = self
            .store
            .transact(|locations, journal| {
                transition::enter(locations, id, engine, journal, Utc::now())
            })
            .await?;

        match &outcome {
            EnterOutcome::Accepted { location, entry } => {
                tracing::debug!(
                    location = %location.name,
                    count = location.current_count,
                    capacity = location.capacity,
                    status = %location.status,
                    "Entry accepted"
                );
                if let EntryChange::Closed { reroute } = entry {
                    tracing::info!(
                        location = %location.name,
                        count = location.current_count,
                        capacity = location.capacity,
                        reroute = reroute.as_deref().unwrap_or("none"),
                        "Entry closed: location over capacity"
                    );
                }
            }
            EnterOutcome::RejectedPhysicalLimit { location, reroute } => {
                tracing::warn!(
                    location = %location.name,
                    count = location.current_count,
                    capacity = location.capacity,
                    reroute = reroute.as_deref().unwrap_or("none"),
                    "Entry rejected: physical limit reached"
                );
            }
            EnterOutcome::RejectedEntryClosed { location, reroute } => {
                tracing::debug!(
                    location = %location.name,
                    reroute = reroute.as_deref().unwrap_or("none"),
                    "Entry rejected: entry closed"
                );
            }
        }

        Ok(outcome)
    }

    /// Record one person leaving `id`.
    pub async fn exit(&self, id: LocationId) -> Result<ExitOutcome, OccupancyError> {
        let engine = &*self.engine;
        let outcome = self
            .store
            .transact(|locations, journal| {
                transition::exit(locations, id, engine, journal, Utc::now())
            })
            .await?;

        tracing::debug!(
            location = %outcome.location.name,
            count = outcome.location.current_count,
            capacity = outcome.location.capacity,
            status = %outcome.location.status,
            "Exit recorded"
        );
        if outcome.entry == EntryChange::Reopened {
            tracing::info!(
                location = %outcome.location.name,
                count = outcome.location.current_count,
                "Entry reopened"
            );
        }

        Ok(outcome)
    }

    /// Run one randomized simulation pass over every location.
    pub async fn simulate_tick(&self) -> Result<TickReport, OccupancyError> {
        let rng = StdRng::from_rng(&mut rand::rng());
        self.simulate_tick_with(rng).await
    }

    /// Run one simulation pass drawing deltas from `rng`.
    pub async fn simulate_tick_with<R>(&self, mut rng: R) -> Result<TickReport, OccupancyError>
    where
        R: Rng + Send,
    {
        let engine = &*self.engine;
        let report = self
            .store
            .transact(move |locations, journal| {
                let now = Utc::now();
                let mut report = TickReport::default();
                for index in 0..locations.len() {
                    let delta = locations
                        .get(index)
                        .map_or(0, |location| draw_delta(location, &mut rng));
                    transition::apply_delta(
                        locations,
                        index,
                        delta,
                        engine,
                        journal,
                        &mut report,
                        now,
                    );
                }
                Ok::<_, OccupancyError>(report)
            })
            .await?;

        for alert in &report.alerts {
            tracing::info!(
                location = %alert.location,
                reroute = alert.reroute_suggestion.as_deref().unwrap_or("none"),
                "Entry closed during simulation"
            );
        }
        tracing::debug!(
            changed = report.changes.len(),
            alerts = report.alerts.len(),
            "Simulation tick applied"
        );

        Ok(report)
    }

    /// Zero every location's count, status, and entry gate. Writes no log
    /// rows. Returns the number of locations that changed.
    pub async fn reset(&self) -> Result<usize, OccupancyError> {
        let changed = self
            .store
            .transact(|locations, _| {
                let now = Utc::now();
                let changed = locations
                    .iter_mut()
                    .map(|location| transition::reset(location, now))
                    .filter(|&changed| changed)
                    .count();
                Ok::<_, OccupancyError>(changed)
            })
            .await?;

        tracing::info!(changed, "All counts reset");
        Ok(changed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use crowdwatch_db::MemoryStore;
    use crowdwatch_types::{AlertType, LocationSeed, LocationStatus, LogAction};

    use super::*;

    async fn service() -> OccupancyService<MemoryStore> {
        let store = MemoryStore::new();
        store
            .seed(&[
                LocationSeed::new("Cafeteria", 30),
                LocationSeed::new("Admin Block", 50),
                LocationSeed::new("Academic Block", 150),
                LocationSeed::new("Basketball Court", 20),
            ])
            .await
            .unwrap();
        OccupancyService::new(store, Arc::new(DecisionEngine::campus()))
    }

    async fn enter_times(service: &OccupancyService<MemoryStore>, id: LocationId, times: u32) {
        for _ in 0..times {
            service.enter(id).await.unwrap();
        }
    }

    #[tokio::test]
    async fn overload_closes_alerts_and_exit_reopens() {
        let service = service().await;
        let cafeteria = LocationId::new(1);

        enter_times(&service, cafeteria, 30).await;
        let at_capacity = service.store().location(cafeteria).await.unwrap().unwrap();
        assert_eq!(at_capacity.status, LocationStatus::Warning);
        assert!(!at_capacity.entry_closed);

        let outcome = service.enter(cafeteria).await.unwrap();
        let EnterOutcome::Accepted { location, entry } = outcome else {
            panic!("expected acceptance, got {outcome:?}");
        };
        assert_eq!(location.current_count, 31);
        assert_eq!(location.status, LocationStatus::Critical);
        assert!(matches!(entry, EntryChange::Closed { reroute: Some(_) }));

        let alerts = service.store().recent_alerts(10).await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, AlertType::Critical);
        assert_eq!(alerts[0].reroute_suggestion.as_deref(), Some("Academic Block"));

        let rejected = service.enter(cafeteria).await.unwrap();
        assert!(!rejected.is_accepted());
        assert_eq!(rejected.location().current_count, 31);

        let exit = service.exit(cafeteria).await.unwrap();
        assert_eq!(exit.location.current_count, 30);
        assert_eq!(exit.location.status, LocationStatus::Warning);
        assert!(!exit.location.entry_closed);
        assert_eq!(exit.entry, EntryChange::Reopened);

        let logs = service.store().recent_logs(Some(cafeteria), 100).await.unwrap();
        assert_eq!(logs.len(), 32, "31 accepted entries and one exit");
        assert_eq!(logs[0].action, LogAction::Exit);
    }

    #[tokio::test]
    async fn unknown_location_is_not_found() {
        let service = service().await;
        assert!(matches!(
            service.enter(LocationId::new(42)).await,
            Err(OccupancyError::NotFound(_))
        ));
        assert!(matches!(
            service.exit(LocationId::new(42)).await,
            Err(OccupancyError::NotFound(_))
        ));
        assert!(service.store().recent_logs(None, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn reset_twice_matches_reset_once() {
        let service = service().await;
        enter_times(&service, LocationId::new(4), 21).await;

        assert_eq!(service.reset().await.unwrap(), 1);
        let once = service.store().locations().await.unwrap();
        assert_eq!(service.reset().await.unwrap(), 0);
        let twice = service.store().locations().await.unwrap();

        assert_eq!(once, twice);
        for location in &twice {
            assert_eq!(location.current_count, 0);
            assert_eq!(location.status, LocationStatus::Normal);
            assert!(!location.entry_closed);
        }
        let logs = service.store().recent_logs(None, 100).await.unwrap();
        assert_eq!(logs.len(), 21, "reset writes no log rows");
    }

    #[tokio::test]
    async fn simulation_preserves_invariants() {
        let service = service().await;
        let engine = DecisionEngine::campus();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            let seed = rng.random();
            let report = service
                .simulate_tick_with(StdRng::seed_from_u64(seed))
                .await
                .unwrap();
            assert!(report.changes.iter().all(|change| change.change != 0));

            for location in service.store().locations().await.unwrap() {
                assert!(location.current_count <= location.hard_limit());
                assert_eq!(
                    location.status,
                    engine.status(location.current_count, location.capacity)
                );
                assert_eq!(location.entry_closed, location.is_overloaded());
            }
        }
        assert!(service.store().recent_logs(None, 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn simulation_is_deterministic_for_a_seed() {
        let first = service().await;
        let second = service().await;

        let a = first.simulate_tick_with(StdRng::seed_from_u64(11)).await.unwrap();
        let b = second.simulate_tick_with(StdRng::seed_from_u64(11)).await.unwrap();
        assert_eq!(a, b);
    }
}
