//! HTTP API for the Crowdwatch occupancy service.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **Movement endpoints** (`/enter`, `/exit`) that run through the
//!   shared [`OccupancyService`](crowdwatch_core::OccupancyService)
//! - **Query endpoints** for status, history, alerts, forecasts, and the
//!   campus summary
//! - **Demo controls** (`/reset`, `/simulate`)
//! - **Admin login** issuing HS256 bearer tokens, and a protected
//!   `/session` route that verifies them
//!
//! # Architecture
//!
//! Handlers are generic over the [`OccupancyStore`](crowdwatch_db::OccupancyStore)
//! so the same router serves the `PostgreSQL` store in production and the
//! in-memory store in tests. Refused entries are `200` responses with
//! `success: false`; only unknown locations, bad queries, failed auth, and
//! store failures map to error statuses through [`ApiError`].

pub mod auth;
pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use auth::{AdminAuth, AdminSession, Claims, TokenResponse};
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
