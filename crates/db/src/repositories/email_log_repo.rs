//! Repository for the `email_logs` table.

use dokuportal_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::audit::{EmailStats, NewEmailLog};

/// Append-only per-send audit trail. Rows are never updated.
pub struct EmailLogRepo;

impl EmailLogRepo {
    /// Record one send attempt, returning the generated ID.
    pub async fn insert(pool: &PgPool, log: &NewEmailLog) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO email_logs \
             (action, recipient, record_count, sent_count, failed_count, details) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING id",
        )
        .bind(&log.action)
        .bind(&log.recipient)
        .bind(log.record_count)
        .bind(log.sent_count)
        .bind(log.failed_count)
        .bind(&log.details)
        .fetch_one(pool)
        .await
    }

    /// Aggregate send statistics for attempts logged at or after `since`.
    pub async fn stats_since(pool: &PgPool, since: Timestamp) -> Result<EmailStats, sqlx::Error> {
        sqlx::query_as::<_, EmailStats>(
            "SELECT COUNT(*) AS total_attempts, \
                    COALESCE(SUM(sent_count), 0)::BIGINT AS total_sent, \
                    COALESCE(SUM(failed_count), 0)::BIGINT AS total_failed, \
                    MAX(created_at) FILTER (WHERE sent_count > 0) AS last_sent_at \
             FROM email_logs \
             WHERE created_at >= $1",
        )
        .bind(since)
        .fetch_one(pool)
        .await
    }
}
