//! Axum router construction for the occupancy API.
//!
//! Assembles all routes into a single [`Router`] with CORS enabled for
//! cross-origin dashboard access and request tracing on every call.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use crowdwatch_db::OccupancyStore;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- service name and version
/// - `POST /login` -- admin login (`?username=&password=`)
/// - `GET /session` -- verify a bearer token (admin only)
/// - `POST /enter`, `POST /exit` -- movement events (`?location_id=`)
/// - `GET /status` -- every location with load figures
/// - `GET /history` -- recent movements (`?location_id=&limit=`)
/// - `GET /alerts` -- recent alerts (`?limit=`)
/// - `POST /reset` -- zero every location
/// - `POST /simulate` -- one randomized tick
/// - `GET /forecast/{id}` -- hourly forecast
/// - `GET /summary` -- campus totals and recommendations
///
/// `/reset` and `/simulate` take no token.
pub fn build_router<S: OccupancyStore>(state: Arc<AppState<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        // Auth
        .route("/login", post(handlers::login::<S>))
        .route("/session", get(handlers::session))
        // Movements
        .route("/enter", post(handlers::enter::<S>))
        .route("/exit", post(handlers::exit::<S>))
        // Queries
        .route("/status", get(handlers::status::<S>))
        .route("/history", get(handlers::history::<S>))
        .route("/alerts", get(handlers::alerts::<S>))
        .route("/forecast/{id}", get(handlers::forecast::<S>))
        .route("/summary", get(handlers::summary::<S>))
        // Demo controls
        .route("/reset", post(handlers::reset::<S>))
        .route("/simulate", post(handlers::simulate::<S>))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
