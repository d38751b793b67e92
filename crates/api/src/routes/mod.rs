pub mod health;
pub mod reminder;

use axum::Router;

use crate::state::AppState;

/// Build the application route tree.
///
/// ```text
/// /health                     service + database health
///
/// /reminder/daily             GET (scheduler), POST (manual + debug modes)
/// /reminder/status            read-only aggregates
/// ```
pub fn app_routes() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/reminder", reminder::router())
}
