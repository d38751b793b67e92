//! Persistence seam for the reminder runs.
//!
//! Everything a run reads or writes goes through [`ReminderStore`], so the
//! orchestration in [`crate::jobs`] can be exercised end to end with an
//! in-memory store the same way the dispatch loop is exercised with a
//! scripted [`crate::Mailer`]. Production wiring uses [`PgStore`], which
//! delegates to the sqlx repositories.

use async_trait::async_trait;
use chrono::NaiveDate;

use dokuportal_core::types::DbId;
use dokuportal_db::models::{DocumentRecord, NewCronLog, NewEmailLog};
use dokuportal_db::repositories::{CronLogRepo, DocumentRepo, EmailLogRepo, UserRepo};
use dokuportal_db::DbPool;

/// The repository calls a reminder run makes.
#[async_trait]
pub trait ReminderStore: Send + Sync {
    /// Active records expiring inside `[start, end]` (inclusive).
    async fn list_expiring_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DocumentRecord>, sqlx::Error>;

    /// Emails of the verified admin/manager distribution list.
    async fn list_reminder_recipients(&self) -> Result<Vec<String>, sqlx::Error>;

    /// Stamp the scanned window with the time of the reminder pass.
    async fn touch_reminder_checked(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<u64, sqlx::Error>;

    /// Append one run-level audit row.
    async fn insert_cron_log(&self, log: &NewCronLog) -> Result<DbId, sqlx::Error>;

    /// Append one per-send audit row.
    async fn insert_email_log(&self, log: &NewEmailLog) -> Result<DbId, sqlx::Error>;
}

/// Production store over the connection pool.
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReminderStore for PgStore {
    async fn list_expiring_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DocumentRecord>, sqlx::Error> {
        DocumentRepo::list_expiring_between(&self.pool, start, end).await
    }

    async fn list_reminder_recipients(&self) -> Result<Vec<String>, sqlx::Error> {
        UserRepo::list_reminder_recipients(&self.pool).await
    }

    async fn touch_reminder_checked(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<u64, sqlx::Error> {
        DocumentRepo::touch_reminder_checked(&self.pool, start, end).await
    }

    async fn insert_cron_log(&self, log: &NewCronLog) -> Result<DbId, sqlx::Error> {
        CronLogRepo::insert(&self.pool, log).await
    }

    async fn insert_email_log(&self, log: &NewEmailLog) -> Result<DbId, sqlx::Error> {
        EmailLogRepo::insert(&self.pool, log).await
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use super::*;

    /// In-memory store for exercising the runs without Postgres.
    ///
    /// Reads are served from the seeded fields; writes are collected for
    /// assertion. `fail_recipient_query` simulates a broken role query.
    #[derive(Default)]
    pub struct MemoryStore {
        pub records: Vec<DocumentRecord>,
        pub recipients: Vec<String>,
        pub fail_recipient_query: bool,
        pub cron_logs: Mutex<Vec<NewCronLog>>,
        pub email_logs: Mutex<Vec<NewEmailLog>>,
        pub touched_windows: Mutex<Vec<(NaiveDate, NaiveDate)>>,
    }

    #[async_trait]
    impl ReminderStore for MemoryStore {
        async fn list_expiring_between(
            &self,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<DocumentRecord>, sqlx::Error> {
            Ok(self.records.clone())
        }

        async fn list_reminder_recipients(&self) -> Result<Vec<String>, sqlx::Error> {
            if self.fail_recipient_query {
                Err(sqlx::Error::PoolClosed)
            } else {
                Ok(self.recipients.clone())
            }
        }

        async fn touch_reminder_checked(
            &self,
            start: NaiveDate,
            end: NaiveDate,
        ) -> Result<u64, sqlx::Error> {
            self.touched_windows.lock().unwrap().push((start, end));
            Ok(self.records.len() as u64)
        }

        async fn insert_cron_log(&self, log: &NewCronLog) -> Result<DbId, sqlx::Error> {
            let mut logs = self.cron_logs.lock().unwrap();
            logs.push(log.clone());
            Ok(logs.len() as DbId)
        }

        async fn insert_email_log(&self, log: &NewEmailLog) -> Result<DbId, sqlx::Error> {
            let mut logs = self.email_logs.lock().unwrap();
            logs.push(log.clone());
            Ok(logs.len() as DbId)
        }
    }
}
