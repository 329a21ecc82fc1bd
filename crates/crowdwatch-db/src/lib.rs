//! Data layer for the Crowdwatch occupancy service.
//!
//! One store of record holds three collections: `locations` (mutated in
//! place), `logs` and `alerts` (append-only). The event processor never
//! writes them directly; it goes through [`OccupancyStore::transact`],
//! which serializes every read-modify-write against the location rows.
//!
//! # Architecture
//!
//! ```text
//! Event processor
//!     |
//!     +-- transact(|locations, journal| ...) --> OccupancyStore
//!                                                 |-- MemoryStore (RwLock, no DATABASE_URL)
//!                                                 +-- PgStore     (SELECT ... FOR UPDATE)
//! ```
//!
//! # Modules
//!
//! - [`store`] -- The [`OccupancyStore`] trait and [`Journal`]
//! - [`memory`] -- In-memory implementation
//! - [`pg_store`] -- `PostgreSQL` implementation and row mappings
//! - [`postgres`] -- `PostgreSQL` connection pool and configuration
//! - [`error`] -- Shared error types

pub mod error;
pub mod memory;
pub mod pg_store;
pub mod postgres;
pub mod store;

// Re-export primary types for convenience.
pub use error::DbError;
pub use memory::MemoryStore;
pub use pg_store::{AlertRow, LocationRow, LogRow, PgStore};
pub use postgres::{PostgresConfig, PostgresPool};
pub use store::{AlertDraft, Journal, LogDraft, OccupancyStore};
