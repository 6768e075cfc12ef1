use std::sync::Arc;

use crate::auth::session::SessionStore;
use crate::config::Config;
use crate::intake::ResumeStorage;
use crate::store::PlacementStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Relational store. PostgreSQL in production.
    pub store: Arc<dyn PlacementStore>,
    /// Server-side sessions. Redis in production.
    pub sessions: Arc<dyn SessionStore>,
    pub resumes: ResumeStorage,
    pub config: Config,
}
