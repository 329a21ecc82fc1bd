//! Shared application state for the HTTP API.

use crowdwatch_core::OccupancyService;
use crowdwatch_db::OccupancyStore;

use crate::auth::AdminAuth;

/// Everything a handler needs, shared behind an `Arc`.
#[derive(Debug)]
pub struct AppState<S> {
    /// Event processor and query surface.
    pub service: OccupancyService<S>,
    /// Admin credential and token keys.
    pub auth: AdminAuth,
}

impl<S: OccupancyStore> AppState<S> {
    /// Bundle a service with its auth settings.
    pub const fn new(service: OccupancyService<S>, auth: AdminAuth) -> Self {
        Self { service, auth }
    }
}
