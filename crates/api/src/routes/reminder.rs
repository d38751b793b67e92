//! Route definitions for the `/reminder` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::reminder;
use crate::state::AppState;

/// Routes mounted at `/reminder`.
///
/// ```text
/// GET    /daily     -> trigger_daily_get   (scheduler, gated)
/// POST   /daily     -> trigger_daily_post  (manual + debug modes, gated)
/// GET    /status    -> reminder_status     (open, read-only)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/daily",
            get(reminder::trigger_daily_get).post(reminder::trigger_daily_post),
        )
        .route("/status", get(reminder::reminder_status))
}
