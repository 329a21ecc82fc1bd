//! `PostgreSQL`-backed [`OccupancyStore`].
//!
//! [`transact`](OccupancyStore::transact) opens a transaction and locks
//! every location row with `SELECT ... FOR UPDATE` before handing them to
//! the caller. Concurrent writers queue on those row locks, so two
//! entries can never both pass the capacity check against the same
//! count. Only rows that actually changed are written back.

use chrono::{DateTime, Utc};
use crowdwatch_types::{
    Alert, AlertId, AlertType, Location, LocationId, LocationSeed, LocationStatus, LogAction,
    LogEntry, LogId,
};
use sqlx::{Postgres, Transaction};

use crate::error::DbError;
use crate::postgres::PostgresPool;
use crate::store::{AlertDraft, Journal, LogDraft, OccupancyStore};

const SELECT_ALL_LOCATIONS: &str = r"SELECT id, name, capacity, current_count, status, entry_closed, created_at, updated_at
      FROM locations
      ORDER BY id";

const SELECT_LOCATION_BY_ID: &str = r"SELECT id, name, capacity, current_count, status, entry_closed, created_at, updated_at
      FROM locations
      WHERE id = $1";

const LOCK_ALL_LOCATIONS: &str = r"SELECT id, name, capacity, current_count, status, entry_closed, created_at, updated_at
      FROM locations
      ORDER BY id
      FOR UPDATE";

/// Store of record backed by a [`PostgresPool`].
#[derive(Clone)]
pub struct PgStore {
    pool: PostgresPool,
}

impl PgStore {
    /// Wrap a connected pool. Migrations must already have run.
    pub const fn new(pool: PostgresPool) -> Self {
        Self { pool }
    }
}

impl OccupancyStore for PgStore {
    async fn seed(&self, seeds: &[LocationSeed]) -> Result<Vec<Location>, DbError> {
        let mut tx = self.pool.pool().begin().await?;
        for seed in seeds {
            let capacity = to_db_count(seed.capacity, "capacity")?;
            let inserted = sqlx::query(
                r"INSERT INTO locations (name, capacity)
                  VALUES ($1, $2)
                  ON CONFLICT (name) DO NOTHING",
            )
            .bind(&seed.name)
            .bind(capacity)
            .execute(&mut *tx)
            .await?;
            if inserted.rows_affected() > 0 {
                tracing::debug!(name = %seed.name, capacity = seed.capacity, "Seeded location");
            }
        }
        tx.commit().await?;

        self.locations().await
    }

    async fn locations(&self) -> Result<Vec<Location>, DbError> {
        let rows = sqlx::query_as::<_, LocationRow>(SELECT_ALL_LOCATIONS)
            .fetch_all(self.pool.pool())
            .await?;
        rows.into_iter().map(Location::try_from).collect()
    }

    async fn location(&self, id: LocationId) -> Result<Option<Location>, DbError> {
        let row = sqlx::query_as::<_, LocationRow>(SELECT_LOCATION_BY_ID)
            .bind(id.into_inner())
            .fetch_optional(self.pool.pool())
            .await?;
        row.map(Location::try_from).transpose()
    }

    async fn recent_logs(
        &self,
        location: Option<LocationId>,
        limit: usize,
    ) -> Result<Vec<LogEntry>, DbError> {
        let rows = sqlx::query_as::<_, LogRow>(
            r"SELECT id, location_id, action, timestamp
              FROM logs
              WHERE ($1::BIGINT IS NULL OR location_id = $1)
              ORDER BY timestamp DESC, id DESC
              LIMIT $2",
        )
        .bind(location.map(LocationId::into_inner))
        .bind(to_db_limit(limit))
        .fetch_all(self.pool.pool())
        .await?;
        rows.into_iter().map(LogEntry::try_from).collect()
    }

    async fn recent_alerts(&self, limit: usize) -> Result<Vec<Alert>, DbError> {
        let rows = sqlx::query_as::<_, AlertRow>(
            r"SELECT id, location_id, message, alert_type, reroute_suggestion, timestamp
              FROM alerts
              ORDER BY timestamp DESC, id DESC
              LIMIT $1",
        )
        .bind(to_db_limit(limit))
        .fetch_all(self.pool.pool())
        .await?;
        rows.into_iter().map(Alert::try_from).collect()
    }

    async fn transact<R, E, F>(&self, f: F) -> Result<R, E>
    where
        F: FnOnce(&mut [Location], &mut Journal) -> Result<R, E> + Send,
        R: Send,
        E: From<DbError> + Send,
    {
        let mut tx = self.pool.pool().begin().await.map_err(DbError::from)?;

        let rows = sqlx::query_as::<_, LocationRow>(LOCK_ALL_LOCATIONS)
            .fetch_all(&mut *tx)
            .await
            .map_err(DbError::from)?;
        let before = rows
            .into_iter()
            .map(Location::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        let mut after = before.clone();
        let mut journal = Journal::new();
        // Dropping `tx` on the error path rolls the transaction back.
        let result = f(&mut after, &mut journal)?;

        for (old, new) in before.iter().zip(&after) {
            if old != new {
                update_location(&mut tx, new).await?;
            }
        }
        let (logs, alerts) = journal.into_parts();
        for draft in &logs {
            insert_log(&mut tx, draft).await?;
        }
        for draft in &alerts {
            insert_alert(&mut tx, draft).await?;
        }

        tx.commit().await.map_err(DbError::from)?;

        tracing::debug!(
            logs = logs.len(),
            alerts = alerts.len(),
            "Committed occupancy transaction"
        );
        Ok(result)
    }
}

async fn update_location(
    tx: &mut Transaction<'static, Postgres>,
    location: &Location,
) -> Result<(), DbError> {
    sqlx::query(
        r"UPDATE locations
          SET current_count = $2, status = $3, entry_closed = $4, updated_at = $5
          WHERE id = $1",
    )
    .bind(location.id.into_inner())
    .bind(to_db_count(location.current_count, "current_count")?)
    .bind(location.status.as_db())
    .bind(location.entry_closed)
    .bind(location.updated_at)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

async fn insert_log(
    tx: &mut Transaction<'static, Postgres>,
    draft: &LogDraft,
) -> Result<(), DbError> {
    sqlx::query(r"INSERT INTO logs (location_id, action, timestamp) VALUES ($1, $2, $3)")
        .bind(draft.location_id.into_inner())
        .bind(draft.action.as_db())
        .bind(draft.timestamp)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

async fn insert_alert(
    tx: &mut Transaction<'static, Postgres>,
    draft: &AlertDraft,
) -> Result<(), DbError> {
    sqlx::query(
        r"INSERT INTO alerts (location_id, message, alert_type, reroute_suggestion, timestamp)
          VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(draft.location_id.into_inner())
    .bind(&draft.message)
    .bind(draft.alert_type.as_db())
    .bind(draft.reroute_suggestion.as_deref())
    .bind(draft.timestamp)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

fn to_db_count(value: u32, column: &str) -> Result<i32, DbError> {
    i32::try_from(value).map_err(|e| DbError::Decode(format!("{column} {value} out of range: {e}")))
}

fn to_db_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn from_db_count(value: i32, column: &str) -> Result<u32, DbError> {
    u32::try_from(value).map_err(|e| DbError::Decode(format!("{column} {value} is negative: {e}")))
}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// A row from the `locations` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LocationRow {
    /// Row ID.
    pub id: i64,
    /// Unique name.
    pub name: String,
    /// Rated capacity.
    pub capacity: i32,
    /// Current head count.
    pub current_count: i32,
    /// Status text (`NORMAL` / `WARNING` / `CRITICAL`).
    pub status: String,
    /// Whether entry is closed.
    pub entry_closed: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<LocationRow> for Location {
    type Error = DbError;

    fn try_from(row: LocationRow) -> Result<Self, Self::Error> {
        let status = LocationStatus::from_db(&row.status)
            .ok_or_else(|| DbError::Decode(format!("unknown status '{}'", row.status)))?;
        Ok(Self {
            id: LocationId::new(row.id),
            name: row.name,
            capacity: from_db_count(row.capacity, "capacity")?,
            current_count: from_db_count(row.current_count, "current_count")?,
            status,
            entry_closed: row.entry_closed,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// A row from the `logs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LogRow {
    /// Row ID.
    pub id: i64,
    /// Referenced location.
    pub location_id: i64,
    /// Action text (`enter` / `exit`).
    pub action: String,
    /// When the movement was recorded.
    pub timestamp: DateTime<Utc>,
}

impl TryFrom<LogRow> for LogEntry {
    type Error = DbError;

    fn try_from(row: LogRow) -> Result<Self, Self::Error> {
        let action = LogAction::from_db(&row.action)
            .ok_or_else(|| DbError::Decode(format!("unknown log action '{}'", row.action)))?;
        Ok(Self {
            id: LogId::new(row.id),
            location_id: LocationId::new(row.location_id),
            action,
            timestamp: row.timestamp,
        })
    }
}

/// A row from the `alerts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AlertRow {
    /// Row ID.
    pub id: i64,
    /// Referenced location.
    pub location_id: i64,
    /// Generated text.
    pub message: String,
    /// Alert type text (`warning` / `critical` / `reroute`).
    pub alert_type: String,
    /// Suggested alternative location.
    pub reroute_suggestion: Option<String>,
    /// When the alert was raised.
    pub timestamp: DateTime<Utc>,
}

impl TryFrom<AlertRow> for Alert {
    type Error = DbError;

    fn try_from(row: AlertRow) -> Result<Self, Self::Error> {
        let alert_type = AlertType::from_db(&row.alert_type)
            .ok_or_else(|| DbError::Decode(format!("unknown alert type '{}'", row.alert_type)))?;
        Ok(Self {
            id: AlertId::new(row.id),
            location_id: LocationId::new(row.location_id),
            message: row.message,
            alert_type,
            reroute_suggestion: row.reroute_suggestion,
            timestamp: row.timestamp,
        })
    }
}
