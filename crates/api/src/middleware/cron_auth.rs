//! Shared-secret gate for the reminder trigger endpoints.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use dokuportal_core::error::CoreError;

use crate::error::AppError;
use crate::state::AppState;

/// How an accepted trigger request authenticated itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerSource {
    /// The external scheduler's user-agent signature matched.
    Scheduler,
    /// A manual caller presented the shared bearer secret.
    Manual,
}

impl TriggerSource {
    /// Label used in the response `details.source`.
    pub fn as_str(self) -> &'static str {
        match self {
            TriggerSource::Scheduler => "scheduler",
            TriggerSource::Manual => "manual",
        }
    }
}

/// Extractor gating the trigger endpoints.
///
/// A request is accepted if EITHER its `user-agent` starts with the
/// configured scheduler signature OR its `Authorization: Bearer <secret>`
/// matches `CRON_SECRET`. Anything else is rejected with 401 before any
/// repository query or audit write happens.
///
/// ```ignore
/// async fn trigger(trigger: CronTrigger, State(state): State<AppState>) -> AppResult<...> {
///     tracing::info!(source = trigger.source.as_str(), "reminder triggered");
///     // ...
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct CronTrigger {
    pub source: TriggerSource,
}

impl FromRequestParts<AppState> for CronTrigger {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .headers
            .get("user-agent")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();

        if user_agent.starts_with(state.config.cron_user_agent.as_str()) {
            return Ok(CronTrigger { source: TriggerSource::Scheduler });
        }

        let bearer = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        match bearer {
            Some(token) if !state.config.cron_secret.is_empty()
                && token == state.config.cron_secret =>
            {
                Ok(CronTrigger { source: TriggerSource::Manual })
            }
            _ => Err(AppError::Core(CoreError::Unauthorized(
                "Missing or invalid cron credentials".into(),
            ))),
        }
    }
}
