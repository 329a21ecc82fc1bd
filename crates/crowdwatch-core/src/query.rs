//! Read-only projections over the store.
//!
//! Reads never take the transact lock; they see the latest committed
//! snapshot.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use crowdwatch_db::OccupancyStore;
use crowdwatch_decision::{DecisionEngine, ForecastPoint};
use crowdwatch_types::{Alert, AlertId, AlertType, Location, LocationId, LocationStatus, LogEntry};
use rand::Rng;
use serde::Serialize;

use crate::error::OccupancyError;
use crate::processor::OccupancyService;
use crate::summary::{CampusSummary, summarize};

/// Placeholder name for an alert whose location no longer resolves.
pub const UNKNOWN_LOCATION: &str = "Unknown";

/// A location with its derived load figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationView {
    /// Location ID.
    pub id: LocationId,
    /// Location name.
    pub name: String,
    /// Rated capacity.
    pub capacity: u32,
    /// People currently inside.
    pub current_count: u32,
    /// Load classification.
    pub status: LocationStatus,
    /// Whether entry is closed.
    pub entry_closed: bool,
    /// `100 * count / capacity`.
    pub load_percentage: f64,
    /// `max(0, capacity - count)`.
    pub available_capacity: u32,
}

impl LocationView {
    /// Project a location through the engine.
    pub fn new(location: Location, engine: &DecisionEngine) -> Self {
        let load_percentage = engine.load_percentage(location.current_count, location.capacity);
        let available_capacity = location.available_capacity();
        Self {
            id: location.id,
            name: location.name,
            capacity: location.capacity,
            current_count: location.current_count,
            status: location.status,
            entry_closed: location.entry_closed,
            load_percentage,
            available_capacity,
        }
    }
}

/// An alert enriched with its location's name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertView {
    /// Alert ID.
    pub id: AlertId,
    /// Referenced location.
    pub location_id: LocationId,
    /// Location name, or `"Unknown"`.
    pub location_name: String,
    /// Generated text.
    pub message: String,
    /// Alert kind.
    pub alert_type: AlertType,
    /// Suggested alternative location.
    pub reroute_suggestion: Option<String>,
    /// When the alert was raised.
    pub timestamp: DateTime<Utc>,
}

impl AlertView {
    fn new(alert: Alert, location_name: String) -> Self {
        Self {
            id: alert.id,
            location_id: alert.location_id,
            location_name,
            message: alert.message,
            alert_type: alert.alert_type,
            reroute_suggestion: alert.reroute_suggestion,
            timestamp: alert.timestamp,
        }
    }
}

/// Hourly forecast for one location.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    /// Location name.
    pub location: String,
    /// One point per upcoming hour.
    pub points: Vec<ForecastPoint>,
}

impl<S: OccupancyStore> OccupancyService<S> {
    /// Every location with load percentage and available capacity.
    pub async fn status(&self) -> Result<Vec<LocationView>, OccupancyError> {
        let locations = self.store.locations().await?;
        Ok(locations
            .into_iter()
            .map(|location| LocationView::new(location, &self.engine))
            .collect())
    }

    /// The newest `limit` movements (optionally for one location),
    /// returned oldest first.
    pub async fn history(
        &self,
        location: Option<LocationId>,
        limit: Option<usize>,
    ) -> Result<Vec<LogEntry>, OccupancyError> {
        let limit = self.queries.resolve(limit);
        let mut logs = self.store.recent_logs(location, limit).await?;
        logs.reverse();
        Ok(logs)
    }

    /// The newest `limit` alerts with location names, returned oldest first.
    pub async fn alerts(&self, limit: Option<usize>) -> Result<Vec<AlertView>, OccupancyError> {
        let limit = self.queries.resolve(limit);
        let alerts = self.store.recent_alerts(limit).await?;
        let names: BTreeMap<LocationId, String> = self
            .store
            .locations()
            .await?
            .into_iter()
            .map(|location| (location.id, location.name))
            .collect();

        Ok(alerts
            .into_iter()
            .rev()
            .map(|alert| {
                let name = names
                    .get(&alert.location_id)
                    .map_or_else(|| UNKNOWN_LOCATION.to_owned(), Clone::clone);
                AlertView::new(alert, name)
            })
            .collect())
    }

    /// Forecast for `id` starting at the current local hour.
    pub async fn forecast(&self, id: LocationId) -> Result<Forecast, OccupancyError> {
        let location = self.find(id).await?;
        let offset = self.local_offset();
        Ok(self.forecast_for(&location, Utc::now(), offset, &mut rand::rng()))
    }

    /// Forecast for `id` at a fixed instant with a caller-supplied RNG.
    pub async fn forecast_at<R: Rng + Send>(
        &self,
        id: LocationId,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Forecast, OccupancyError> {
        let location = self.find(id).await?;
        Ok(self.forecast_for(&location, now, self.local_offset(), rng))
    }

    /// Campus-wide totals, crowded locations, and recommendations.
    pub async fn summary(&self) -> Result<CampusSummary, OccupancyError> {
        let views = self.status().await?;
        Ok(summarize(&views, self.engine.warning_percent()))
    }

    async fn find(&self, id: LocationId) -> Result<Location, OccupancyError> {
        self.store
            .location(id)
            .await?
            .ok_or(OccupancyError::NotFound(id))
    }

    fn local_offset(&self) -> FixedOffset {
        // Validated at startup; fall back to UTC rather than fail a read.
        self.forecast.offset().unwrap_or_else(|_| Utc.fix())
    }

    fn forecast_for<R: Rng + ?Sized>(
        &self,
        location: &Location,
        now: DateTime<Utc>,
        offset: FixedOffset,
        rng: &mut R,
    ) -> Forecast {
        let local = now.with_timezone(&offset);
        Forecast {
            location: location.name.clone(),
            points: crowdwatch_decision::forecast(
                location.capacity,
                local,
                self.forecast.hours,
                self.forecast.jitter,
                rng,
            ),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;
    use crowdwatch_db::MemoryStore;
    use crowdwatch_types::{LocationSeed, LogAction};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::config::{ForecastConfig, QueryConfig};

    async fn service() -> OccupancyService<MemoryStore> {
        let store = MemoryStore::new();
        store
            .seed(&[
                LocationSeed::new("Cafeteria", 30),
                LocationSeed::new("Admin Block", 50),
            ])
            .await
            .unwrap();
        OccupancyService::new(store, Arc::new(DecisionEngine::campus()))
    }

    #[tokio::test]
    async fn status_projects_load_and_availability() {
        let service = service().await;
        for _ in 0..24 {
            service.enter(LocationId::new(1)).await.unwrap();
        }
        let views = service.status().await.unwrap();
        assert_eq!(views.len(), 2);
        assert!((views[0].load_percentage - 80.0).abs() < 1e-9);
        assert_eq!(views[0].available_capacity, 6);
        assert_eq!(views[0].status, LocationStatus::Warning);
        assert_eq!(views[1].available_capacity, 50);
    }

    #[tokio::test]
    async fn history_window_is_oldest_first_and_filtered_before_limit() {
        let service = service()
            .await
            .with_queries(QueryConfig {
                default_limit: 3,
                max_limit: 4,
            });
        let cafeteria = LocationId::new(1);
        let admin = LocationId::new(2);

        service.enter(cafeteria).await.unwrap();
        service.enter(admin).await.unwrap();
        service.exit(cafeteria).await.unwrap();
        service.enter(admin).await.unwrap();
        service.enter(admin).await.unwrap();

        let window = service.history(None, None).await.unwrap();
        let ids: Vec<i64> = window.iter().map(|log| log.id.into_inner()).collect();
        assert_eq!(ids, vec![3, 4, 5]);

        let cafeteria_only = service.history(Some(cafeteria), None).await.unwrap();
        assert_eq!(cafeteria_only.len(), 2);
        assert_eq!(cafeteria_only[0].action, LogAction::Enter);
        assert_eq!(cafeteria_only[1].action, LogAction::Exit);

        let capped = service.history(None, Some(100)).await.unwrap();
        assert_eq!(capped.len(), 4);
    }

    #[tokio::test]
    async fn alerts_are_enriched_with_names() {
        let service = service().await;
        for _ in 0..31 {
            service.enter(LocationId::new(1)).await.unwrap();
        }
        let alerts = service.alerts(None).await.unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].location_name, "Cafeteria");
        assert_eq!(alerts[0].alert_type, AlertType::Critical);
        assert_eq!(alerts[0].reroute_suggestion.as_deref(), Some("Admin Block"));
    }

    #[tokio::test]
    async fn forecast_uses_local_hour_buckets() {
        let service = service().await.with_forecast(ForecastConfig {
            hours: 5,
            utc_offset_hours: 5,
            jitter: 0.0,
        });
        // 07:30 UTC is 12:30 local.
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 7, 30, 0).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let forecast = service.forecast_at(LocationId::new(1), now, &mut rng).await.unwrap();
        assert_eq!(forecast.location, "Cafeteria");
        let hours: Vec<u32> = forecast.points.iter().map(|p| p.hour).collect();
        assert_eq!(hours, vec![12, 13, 14, 15, 16]);
        assert_eq!(forecast.points[0].time, "12:30 PM");
        assert_eq!(forecast.points[0].predicted_count, 24);
        assert_eq!(forecast.points[0].load_percentage, 80);
        assert_eq!(forecast.points[3].predicted_count, 9);
    }

    #[tokio::test]
    async fn forecast_for_unknown_location_is_not_found() {
        let service = service().await;
        assert!(matches!(
            service.forecast(LocationId::new(9)).await,
            Err(OccupancyError::NotFound(_))
        ));
    }
}
