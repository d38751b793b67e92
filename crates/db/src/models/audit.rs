//! Audit trail models for the `cron_logs` and `email_logs` tables.

use dokuportal_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from `cron_logs`: one per reminder job run.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CronLog {
    pub id: DbId,
    pub job_name: String,
    pub executed_at: Timestamp,
    pub status: String,
    pub records_found: i32,
    pub emails_sent: i32,
    pub emails_failed: i32,
    pub details: Option<serde_json::Value>,
    pub completed_at: Option<Timestamp>,
    pub error_details: Option<String>,
}

/// Insert DTO for `cron_logs`.
#[derive(Debug, Clone)]
pub struct NewCronLog {
    pub job_name: String,
    pub status: String,
    pub records_found: i32,
    pub emails_sent: i32,
    pub emails_failed: i32,
    pub details: Option<serde_json::Value>,
    pub error_details: Option<String>,
}

/// A row from `email_logs`: one per recipient/record send attempt.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EmailLog {
    pub id: DbId,
    pub action: String,
    pub recipient: String,
    pub record_count: i32,
    pub sent_count: i32,
    pub failed_count: i32,
    pub details: Option<serde_json::Value>,
    pub created_at: Timestamp,
}

/// Insert DTO for `email_logs`.
#[derive(Debug, Clone)]
pub struct NewEmailLog {
    pub action: String,
    pub recipient: String,
    pub record_count: i32,
    pub sent_count: i32,
    pub failed_count: i32,
    pub details: Option<serde_json::Value>,
}

/// Aggregate send statistics over a time window (see
/// `EmailLogRepo::stats_since`).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct EmailStats {
    pub total_attempts: i64,
    pub total_sent: i64,
    pub total_failed: i64,
    pub last_sent_at: Option<Timestamp>,
}
