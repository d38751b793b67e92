//! Handlers for the `/reminder` resource.
//!
//! The trigger endpoints are gated by [`CronTrigger`]; the status endpoint
//! is read-only and open.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use dokuportal_core::error::CoreError;
use dokuportal_core::expiry::short_horizon_window;
use dokuportal_core::types::Timestamp;
use dokuportal_db::repositories::{CronLogRepo, DocumentRepo, EmailLogRepo};
use dokuportal_notify::jobs::{
    self, record_failed_run, run_monthly_milestones, run_short_horizon, JOB_MONTHLY,
    JOB_SHORT_HORIZON,
};
use dokuportal_notify::{ApiMailerConfig, SmtpConfig};

use crate::error::{AppError, AppResult};
use crate::middleware::cron_auth::CronTrigger;
use crate::state::AppState;

/// Hours since the last run beyond which the status flips to `warning`.
/// Allows one hour of slack over the 24-hour schedule.
const HEALTH_THRESHOLD_HOURS: i64 = 25;

/// Window for the status endpoint's email statistics.
const STATS_WINDOW_DAYS: i64 = 30;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Success envelope for trigger responses.
#[derive(Debug, Serialize)]
pub struct ReminderResponse {
    pub success: bool,
    pub message: String,
    pub timestamp: Timestamp,
    pub details: serde_json::Value,
}

/// Body of `POST /reminder/daily`. Entirely optional; `test` selects a
/// debug sub-mode that bypasses the normal run.
#[derive(Debug, Default, Deserialize)]
pub struct TriggerBody {
    pub test: Option<String>,
    /// Recipient for the `send_test_email` sub-mode.
    pub recipient: Option<String>,
}

// ---------------------------------------------------------------------------
// Trigger endpoints
// ---------------------------------------------------------------------------

/// GET /reminder/daily
///
/// Scheduler entry point: runs the short-horizon job.
pub async fn trigger_daily_get(
    trigger: CronTrigger,
    State(state): State<AppState>,
) -> AppResult<Json<ReminderResponse>> {
    run_daily(&state, trigger, "GET").await
}

/// POST /reminder/daily
///
/// Manual entry point. Without a `test` field it behaves like the GET; the
/// debug sub-modes (`email_config`, `send_test_email`, `run_monthly_cron`)
/// bypass the normal run for diagnostics.
pub async fn trigger_daily_post(
    trigger: CronTrigger,
    State(state): State<AppState>,
    body: Option<Json<TriggerBody>>,
) -> AppResult<Json<ReminderResponse>> {
    let body = body.map(|Json(b)| b).unwrap_or_default();

    match body.test.as_deref() {
        Some("email_config") => Ok(Json(email_config_report(&state, trigger))),
        Some("send_test_email") => send_test_email(&state, trigger, body.recipient).await,
        Some("run_monthly_cron") => run_monthly(&state, trigger, "POST").await,
        Some(other) => Err(AppError::BadRequest(format!("Unknown test mode: {other}"))),
        None => run_daily(&state, trigger, "POST").await,
    }
}

async fn run_daily(
    state: &AppState,
    trigger: CronTrigger,
    method: &str,
) -> AppResult<Json<ReminderResponse>> {
    let today = Utc::now().date_naive();

    let report = match run_short_horizon(&state.reminder, today).await {
        Ok(report) => report,
        Err(e) => {
            record_failed_run(state.reminder.store.as_ref(), JOB_SHORT_HORIZON, &e.to_string()).await;
            return Err(e.into());
        }
    };

    Ok(Json(ReminderResponse {
        success: true,
        message: format!("Daily expiry reminder completed: {}", report.result),
        timestamp: Utc::now(),
        details: serde_json::json!({
            "total_expiring_records": report.records_found,
            "expiring_records": report.materials,
            "emails_sent": report.emails_sent,
            "emails_failed": report.emails_failed,
            "method": method,
            "source": trigger.source.as_str(),
        }),
    }))
}

async fn run_monthly(
    state: &AppState,
    trigger: CronTrigger,
    method: &str,
) -> AppResult<Json<ReminderResponse>> {
    let today = Utc::now().date_naive();

    let report = match run_monthly_milestones(&state.reminder, today).await {
        Ok(report) => report,
        Err(e) => {
            record_failed_run(state.reminder.store.as_ref(), JOB_MONTHLY, &e.to_string()).await;
            return Err(e.into());
        }
    };

    Ok(Json(ReminderResponse {
        success: true,
        message: format!("Monthly milestone reminder completed: {}", report.result),
        timestamp: Utc::now(),
        details: serde_json::json!({
            "total_expiring_records": report.records_found,
            "monthly_milestone_records": report.milestone_records,
            "emails_sent": report.emails_sent,
            "emails_failed": report.emails_failed,
            "breakdown": report.breakdown,
            "method": method,
            "source": trigger.source.as_str(),
        }),
    }))
}

// ---------------------------------------------------------------------------
// Debug sub-modes
// ---------------------------------------------------------------------------

/// Report which mail transports are configured, without sending anything
/// and without echoing secrets.
fn email_config_report(state: &AppState, trigger: CronTrigger) -> ReminderResponse {
    ReminderResponse {
        success: true,
        message: "Email configuration check".to_string(),
        timestamp: Utc::now(),
        details: serde_json::json!({
            "test": "email_config",
            "smtp_configured": SmtpConfig::from_env().is_some(),
            "email_api_configured": ApiMailerConfig::from_env().is_some(),
            "fallback_recipient_count": state.config.fallback_recipients.len(),
            "source": trigger.source.as_str(),
        }),
    }
}

/// Send a single diagnostic email to the given recipient.
async fn send_test_email(
    state: &AppState,
    trigger: CronTrigger,
    recipient: Option<String>,
) -> AppResult<Json<ReminderResponse>> {
    let recipient = recipient.ok_or_else(|| {
        CoreError::Validation("send_test_email requires a 'recipient' field".to_string())
    })?;

    let provider_id = jobs::send_test_email(&state.reminder, &recipient).await?;

    Ok(Json(ReminderResponse {
        success: true,
        message: format!("Test email sent to {recipient}"),
        timestamp: Utc::now(),
        details: serde_json::json!({
            "test": "send_test_email",
            "provider_id": provider_id,
            "source": trigger.source.as_str(),
        }),
    }))
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// GET /reminder/status
///
/// Read-only aggregate view: last execution metadata, 30-day send
/// statistics, and the currently-expiring record count. `status` is
/// `healthy` while the last run is within [`HEALTH_THRESHOLD_HOURS`].
pub async fn reminder_status(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    let now = Utc::now();

    let last = CronLogRepo::last_execution(&state.pool, JOB_SHORT_HORIZON).await?;

    let stats =
        EmailLogRepo::stats_since(&state.pool, now - chrono::Duration::days(STATS_WINDOW_DAYS))
            .await?;

    let window = short_horizon_window(now.date_naive());
    let expiring =
        DocumentRepo::count_expiring_between(&state.pool, window.start, window.end).await?;

    let hours_since = last.as_ref().map(|l| (now - l.executed_at).num_hours());
    let status = match hours_since {
        Some(h) if h <= HEALTH_THRESHOLD_HOURS => "healthy",
        _ => "warning",
    };

    let success_rate = if stats.total_attempts > 0 {
        Some(stats.total_sent as f64 / stats.total_attempts as f64)
    } else {
        None
    };

    Ok(Json(serde_json::json!({
        "status": status,
        "last_execution": last.as_ref().map(|l| serde_json::json!({
            "job_name": l.job_name,
            "executed_at": l.executed_at,
            "status": l.status,
            "records_found": l.records_found,
            "emails_sent": l.emails_sent,
            "emails_failed": l.emails_failed,
            "hours_since": hours_since,
        })),
        "email_stats_30d": {
            "total_attempts": stats.total_attempts,
            "total_sent": stats.total_sent,
            "total_failed": stats.total_failed,
            "success_rate": success_rate,
            "last_sent_at": stats.last_sent_at,
        },
        "currently_expiring_records": expiring,
        "timestamp": now,
    })))
}
