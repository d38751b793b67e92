//! Repository for the `cron_logs` table.

use dokuportal_core::types::DbId;
use sqlx::PgPool;

use crate::models::audit::{CronLog, NewCronLog};

/// Column list for `cron_logs` queries.
const COLUMNS: &str = "id, job_name, executed_at, status, records_found, \
     emails_sent, emails_failed, details, completed_at, error_details";

/// Append-only run-level audit trail. Rows are never updated.
pub struct CronLogRepo;

impl CronLogRepo {
    /// Record a completed (or failed) job run, returning the generated ID.
    pub async fn insert(pool: &PgPool, log: &NewCronLog) -> Result<DbId, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO cron_logs \
             (job_name, status, records_found, emails_sent, emails_failed, \
              details, completed_at, error_details) \
             VALUES ($1, $2, $3, $4, $5, $6, NOW(), $7) \
             RETURNING id",
        )
        .bind(&log.job_name)
        .bind(&log.status)
        .bind(log.records_found)
        .bind(log.emails_sent)
        .bind(log.emails_failed)
        .bind(&log.details)
        .bind(&log.error_details)
        .fetch_one(pool)
        .await
    }

    /// Most recent run for the given job name, if any.
    pub async fn last_execution(
        pool: &PgPool,
        job_name: &str,
    ) -> Result<Option<CronLog>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM cron_logs \
             WHERE job_name = $1 \
             ORDER BY executed_at DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, CronLog>(&query)
            .bind(job_name)
            .fetch_optional(pool)
            .await
    }
}
