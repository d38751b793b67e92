use std::sync::Arc;

use dokuportal_notify::jobs::ReminderContext;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: dokuportal_db::DbPool,
    /// Server configuration (read by the trigger gate and handlers).
    pub config: Arc<ServerConfig>,
    /// Explicit dependencies for reminder runs (pool, mailer, pacing,
    /// fallback recipients), constructed once at startup.
    pub reminder: Arc<ReminderContext>,
}
