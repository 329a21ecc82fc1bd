//! REST endpoint handlers.
//!
//! Every handler delegates to the shared
//! [`OccupancyService`](crowdwatch_core::OccupancyService) and maps its
//! errors through [`ApiError`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Service name and version |
//! | `POST` | `/login` | Admin login, returns a bearer token |
//! | `GET` | `/session` | Verified admin session (requires token) |
//! | `POST` | `/enter` | Record an entry |
//! | `POST` | `/exit` | Record an exit |
//! | `GET` | `/status` | Every location with load figures |
//! | `GET` | `/history` | Recent movements, oldest first |
//! | `GET` | `/alerts` | Recent alerts, oldest first |
//! | `GET` | `/forecast/{id}` | Hourly forecast for one location |
//! | `GET` | `/summary` | Campus totals and recommendations |
//! | `POST` | `/reset` | Zero every location |
//! | `POST` | `/simulate` | One randomized tick |

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use crowdwatch_core::{
    AlertView, CampusSummary, EnterOutcome, ExitOutcome, LocationView, RaisedAlert, TickChange,
};
use crowdwatch_db::OccupancyStore;
use crowdwatch_decision::ForecastPoint;
use crowdwatch_types::{Location, LocationId, LocationStatus, LogEntry};
use serde::{Deserialize, Serialize};

use crate::auth::{AdminSession, TokenResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// Shared state type for every handler.
type SharedState<S> = State<Arc<AppState<S>>>;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for `POST /login`.
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    /// Admin username.
    pub username: String,
    /// Admin password.
    pub password: String,
}

/// Query parameters for `POST /enter` and `POST /exit`.
#[derive(Debug, Deserialize)]
pub struct LocationQuery {
    /// Target location.
    pub location_id: LocationId,
}

/// Query parameters for `GET /history`.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Restrict to one location.
    pub location_id: Option<LocationId>,
    /// Window size (default and maximum come from config).
    pub limit: Option<usize>,
}

/// Query parameters for `GET /alerts`.
#[derive(Debug, Deserialize)]
pub struct AlertsQuery {
    /// Window size (default and maximum come from config).
    pub limit: Option<usize>,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

/// Body of `GET /`.
#[derive(Debug, Serialize)]
pub struct IndexResponse {
    /// Service name.
    pub message: &'static str,
    /// Crate version.
    pub version: &'static str,
}

/// Body of `POST /enter` and `POST /exit`.
///
/// Refusals are ordinary responses with `success: false`; clients branch
/// on the flag rather than the HTTP status.
#[derive(Debug, Serialize)]
pub struct MovementResponse {
    /// Whether the movement was recorded.
    pub success: bool,
    /// Location name.
    pub location: String,
    /// Count after the event.
    pub current_count: u32,
    /// Location capacity.
    pub capacity: u32,
    /// Status after the event.
    pub status: LocationStatus,
    /// Whether entry is closed after the event.
    pub entry_closed: bool,
    /// Explanation, present on refusal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Whether the caller should be sent elsewhere.
    pub is_reroute: bool,
    /// Suggested alternative location.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reroute_location: Option<String>,
}

impl MovementResponse {
    fn snapshot(location: Location, success: bool) -> Self {
        Self {
            success,
            location: location.name,
            current_count: location.current_count,
            capacity: location.capacity,
            status: location.status,
            entry_closed: location.entry_closed,
            message: None,
            is_reroute: false,
            reroute_location: None,
        }
    }
}

impl From<EnterOutcome> for MovementResponse {
    fn from(outcome: EnterOutcome) -> Self {
        let message = outcome.rejection_message();
        match outcome {
            EnterOutcome::Accepted { location, .. } => Self::snapshot(location, true),
            EnterOutcome::RejectedPhysicalLimit { location, reroute }
            | EnterOutcome::RejectedEntryClosed { location, reroute } => Self {
                message,
                is_reroute: true,
                reroute_location: reroute,
                ..Self::snapshot(location, false)
            },
        }
    }
}

impl From<ExitOutcome> for MovementResponse {
    fn from(outcome: ExitOutcome) -> Self {
        Self::snapshot(outcome.location, true)
    }
}

/// Body of `GET /status`.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Every location, ordered by ID.
    pub locations: Vec<LocationView>,
}

/// Body of `GET /history`.
#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    /// Movements, oldest first.
    pub logs: Vec<LogEntry>,
}

/// Body of `GET /alerts`.
#[derive(Debug, Serialize)]
pub struct AlertsResponse {
    /// Alerts, oldest first.
    pub alerts: Vec<AlertView>,
}

/// Body of `POST /reset`.
#[derive(Debug, Serialize)]
pub struct ResetResponse {
    /// Always `true`.
    pub success: bool,
    /// Human-readable confirmation.
    pub message: &'static str,
    /// Locations that were not already zeroed.
    pub changed: usize,
}

/// Body of `POST /simulate`.
#[derive(Debug, Serialize)]
pub struct SimulateResponse {
    /// Always `true`.
    pub success: bool,
    /// Locations that moved.
    pub changes: Vec<TickChange>,
    /// Alerts raised by the tick.
    pub alerts: Vec<RaisedAlert>,
}

/// Body of `GET /forecast/{id}`.
#[derive(Debug, Serialize)]
pub struct ForecastResponse {
    /// Location name.
    pub location: String,
    /// Hourly points.
    pub forecast: Vec<ForecastPoint>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /` -- service identity.
pub async fn index() -> Json<IndexResponse> {
    Json(IndexResponse {
        message: "Crowdwatch Occupancy API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `POST /login` -- exchange the admin credential for a bearer token.
pub async fn login<S: OccupancyStore>(
    State(state): SharedState<S>,
    query: Result<Query<LoginQuery>, QueryRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Query(params) = query?;
    let token = state.auth.login(&params.username, &params.password)?;
    Ok(Json(token))
}

/// `GET /session` -- echo the verified admin session.
pub async fn session(session: AdminSession) -> Json<AdminSession> {
    Json(session)
}

/// `POST /enter` -- admit one person if the location allows it.
pub async fn enter<S: OccupancyStore>(
    State(state): SharedState<S>,
    query: Result<Query<LocationQuery>, QueryRejection>,
) -> Result<Json<MovementResponse>, ApiError> {
    let Query(params) = query?;
    let outcome = state.service.enter(params.location_id).await?;
    Ok(Json(outcome.into()))
}

/// `POST /exit` -- record one person leaving.
pub async fn exit<S: OccupancyStore>(
    State(state): SharedState<S>,
    query: Result<Query<LocationQuery>, QueryRejection>,
) -> Result<Json<MovementResponse>, ApiError> {
    let Query(params) = query?;
    let outcome = state.service.exit(params.location_id).await?;
    Ok(Json(outcome.into()))
}

/// `GET /status` -- every location with load figures.
pub async fn status<S: OccupancyStore>(
    State(state): SharedState<S>,
) -> Result<Json<StatusResponse>, ApiError> {
    let locations = state.service.status().await?;
    Ok(Json(StatusResponse { locations }))
}

/// `GET /history` -- recent movements, oldest first.
pub async fn history<S: OccupancyStore>(
    State(state): SharedState<S>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let Query(params) = query?;
    let limit = positive_limit(params.limit)?;
    let logs = state.service.history(params.location_id, limit).await?;
    Ok(Json(HistoryResponse { logs }))
}

/// `GET /alerts` -- recent alerts with location names, oldest first.
pub async fn alerts<S: OccupancyStore>(
    State(state): SharedState<S>,
    query: Result<Query<AlertsQuery>, QueryRejection>,
) -> Result<Json<AlertsResponse>, ApiError> {
    let Query(params) = query?;
    let limit = positive_limit(params.limit)?;
    let alerts = state.service.alerts(limit).await?;
    Ok(Json(AlertsResponse { alerts }))
}

/// `GET /forecast/{id}` -- hourly forecast for one location.
pub async fn forecast<S: OccupancyStore>(
    State(state): SharedState<S>,
    path: Result<Path<LocationId>, PathRejection>,
) -> Result<Json<ForecastResponse>, ApiError> {
    let Path(id) = path.map_err(|e| ApiError::InvalidQuery(e.body_text()))?;
    let forecast = state.service.forecast(id).await?;
    Ok(Json(ForecastResponse {
        location: forecast.location,
        forecast: forecast.points,
    }))
}

/// `GET /summary` -- campus totals and recommendations.
pub async fn summary<S: OccupancyStore>(
    State(state): SharedState<S>,
) -> Result<Json<CampusSummary>, ApiError> {
    Ok(Json(state.service.summary().await?))
}

/// `POST /reset` -- zero every location.
pub async fn reset<S: OccupancyStore>(
    State(state): SharedState<S>,
) -> Result<Json<ResetResponse>, ApiError> {
    let changed = state.service.reset().await?;
    Ok(Json(ResetResponse {
        success: true,
        message: "All counts reset",
        changed,
    }))
}

/// `POST /simulate` -- one randomized tick over every location.
pub async fn simulate<S: OccupancyStore>(
    State(state): SharedState<S>,
) -> Result<Json<SimulateResponse>, ApiError> {
    let report = state.service.simulate_tick().await?;
    Ok(Json(SimulateResponse {
        success: true,
        changes: report.changes,
        alerts: report.alerts,
    }))
}

fn positive_limit(limit: Option<usize>) -> Result<Option<usize>, ApiError> {
    match limit {
        Some(0) => Err(ApiError::InvalidQuery(String::from("limit must be positive"))),
        other => Ok(other),
    }
}
