//! In-memory [`OccupancyStore`].
//!
//! Used when no database URL is configured and throughout the test
//! suites. A single [`RwLock`] guards all three tables: reads share it,
//! [`transact`](OccupancyStore::transact) holds it exclusively. The
//! closure works on a scratch copy of the location rows, so an `Err`
//! leaves the tables untouched.

use chrono::Utc;
use crowdwatch_types::{Alert, AlertId, Location, LocationId, LocationSeed, LocationStatus, LogEntry, LogId};
use tokio::sync::RwLock;

use crate::error::DbError;
use crate::store::{Journal, OccupancyStore};

#[derive(Debug, Default)]
struct Tables {
    locations: Vec<Location>,
    logs: Vec<LogEntry>,
    alerts: Vec<Alert>,
    last_location_id: i64,
    last_log_id: i64,
    last_alert_id: i64,
}

/// Process-local store backed by vectors.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl OccupancyStore for MemoryStore {
    async fn seed(&self, seeds: &[LocationSeed]) -> Result<Vec<Location>, DbError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();

        for seed in seeds {
            if tables.locations.iter().any(|loc| loc.name == seed.name) {
                continue;
            }
            tables.last_location_id = tables.last_location_id.saturating_add(1);
            let id = LocationId::new(tables.last_location_id);
            tables.locations.push(Location {
                id,
                name: seed.name.clone(),
                capacity: seed.capacity,
                current_count: 0,
                status: LocationStatus::Normal,
                entry_closed: false,
                created_at: now,
                updated_at: now,
            });
            tracing::debug!(%id, name = %seed.name, capacity = seed.capacity, "Seeded location");
        }

        Ok(tables.locations.clone())
    }

    async fn locations(&self) -> Result<Vec<Location>, DbError> {
        Ok(self.tables.read().await.locations.clone())
    }

    async fn location(&self, id: LocationId) -> Result<Option<Location>, DbError> {
        let tables = self.tables.read().await;
        Ok(tables.locations.iter().find(|loc| loc.id == id).cloned())
    }

    async fn recent_logs(
        &self,
        location: Option<LocationId>,
        limit: usize,
    ) -> Result<Vec<LogEntry>, DbError> {
        let tables = self.tables.read().await;
        Ok(tables
            .logs
            .iter()
            .rev()
            .filter(|entry| location.is_none_or(|id| entry.location_id == id))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn recent_alerts(&self, limit: usize) -> Result<Vec<Alert>, DbError> {
        let tables = self.tables.read().await;
        Ok(tables.alerts.iter().rev().take(limit).cloned().collect())
    }

    async fn transact<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut [Location], &mut Journal) -> Result<R, E> + Send,
        R: Send,
        E: From<DbError> + Send,
    {
        let mut tables = self.tables.write().await;

        let mut scratch = tables.locations.clone();
        let mut journal = Journal::new();
        let result = f(&mut scratch, &mut journal)?;

        tables.locations = scratch;
        let (logs, alerts) = journal.into_parts();
        for draft in logs {
            tables.last_log_id = tables.last_log_id.saturating_add(1);
            let id = LogId::new(tables.last_log_id);
            tables.logs.push(draft.into_entry(id));
        }
        for draft in alerts {
            tables.last_alert_id = tables.last_alert_id.saturating_add(1);
            let id = AlertId::new(tables.last_alert_id);
            tables.alerts.push(draft.into_alert(id));
        }

        Ok(result)
    }
}
