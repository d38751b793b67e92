//! The two reminder job entry points.
//!
//! Each run is request-scoped: it re-queries the repository, recomputes
//! buckets from scratch, dispatches, and writes the audit trail. Only an
//! upstream query failure propagates ([`JobError::Database`]); per-send
//! failures are absorbed into the counters and audit-write failures are
//! downgraded to warnings.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;

use dokuportal_core::expiry::{
    classify, monthly_outer_window, short_horizon_window, MilestoneBucket,
};
use dokuportal_db::models::{NewCronLog, NewEmailLog};

use crate::compose::{compose_milestone_digest, compose_short_horizon};
use crate::dispatch::{
    send_concurrent, send_sequential, summarize, DispatchItem, DispatchOutcome, OutcomeSink,
};
use crate::mailer::{Mailer, OutboundEmail};
use crate::recipients::{group_by_owner, resolve_distribution_list, BucketedRecord};
use crate::store::ReminderStore;

/// Job name written to `cron_logs` by the short-horizon run.
pub const JOB_SHORT_HORIZON: &str = "daily_expiry_reminder";

/// Job name written to `cron_logs` by the monthly-milestone run.
pub const JOB_MONTHLY: &str = "monthly_milestone_reminder";

/// Action tag on `email_logs` rows from the short-horizon run.
const ACTION_EXPIRY_ALERT: &str = "expiry_alert";

/// Action tag on `email_logs` rows from the monthly run.
const ACTION_MILESTONE_DIGEST: &str = "milestone_digest";

// ---------------------------------------------------------------------------
// Context / errors / reports
// ---------------------------------------------------------------------------

/// Explicit dependencies for a job run, constructed once at process start.
#[derive(Clone)]
pub struct ReminderContext {
    pub store: Arc<dyn ReminderStore>,
    pub mailer: Arc<dyn Mailer>,
    /// Fixed inter-send delay for the sequential monthly loop.
    pub pacing: Duration,
    /// Configured fallback distribution list for the short-horizon job.
    pub fallback_recipients: Vec<String>,
    /// Public base URL of the portal, linked in email footers.
    pub portal_url: String,
}

/// Errors that abort a run. Everything per-item is absorbed instead.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    /// The upstream repository query failed.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Per-bucket record counts for one monthly run.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct MilestoneBreakdown {
    pub three_months: i32,
    pub two_months: i32,
    pub one_month: i32,
    pub other: i32,
}

impl MilestoneBreakdown {
    fn tally(&mut self, bucket: MilestoneBucket) {
        match bucket {
            MilestoneBucket::ThreeMonths => self.three_months += 1,
            MilestoneBucket::TwoMonths => self.two_months += 1,
            MilestoneBucket::OneMonth => self.one_month += 1,
            MilestoneBucket::Other => self.other += 1,
        }
    }
}

/// Outcome of a short-horizon run.
#[derive(Debug, Clone, Serialize)]
pub struct ShortHorizonReport {
    pub records_found: i32,
    pub materials: Vec<String>,
    pub recipient_count: i32,
    pub emails_sent: i32,
    pub emails_failed: i32,
    pub result: String,
}

/// Outcome of a monthly-milestone run.
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReport {
    pub records_found: i32,
    pub milestone_records: i32,
    pub recipient_count: i32,
    pub emails_sent: i32,
    pub emails_failed: i32,
    pub breakdown: MilestoneBreakdown,
    pub result: String,
}

// ---------------------------------------------------------------------------
// Audit sink
// ---------------------------------------------------------------------------

/// Writes one `email_logs` row per outcome. Insert failures are warned and
/// swallowed; audit is never allowed to fail a run.
struct EmailLogSink<'a> {
    store: &'a dyn ReminderStore,
    action: &'static str,
}

#[async_trait]
impl OutcomeSink for EmailLogSink<'_> {
    async fn record(&self, outcome: &DispatchOutcome) {
        let (sent_count, failed_count) = match outcome.result {
            Ok(_) => (1, 0),
            Err(_) => (0, 1),
        };

        let mut details = outcome.details.clone();
        if let Err(e) = &outcome.result {
            if let Some(obj) = details.as_object_mut() {
                obj.insert("error".to_string(), serde_json::json!(e.to_string()));
            }
        }

        let log = NewEmailLog {
            action: self.action.to_string(),
            recipient: outcome.recipient.clone(),
            record_count: outcome.record_count,
            sent_count,
            failed_count,
            details: Some(details),
        };

        if let Err(e) = self.store.insert_email_log(&log).await {
            tracing::warn!(error = %e, action = self.action, "Failed to write email log entry");
        }
    }
}

// ---------------------------------------------------------------------------
// Short-horizon run
// ---------------------------------------------------------------------------

/// Run the short-horizon job: alert the distribution list about every
/// active document expiring within the next three days, one email per
/// record, fanned out concurrently.
pub async fn run_short_horizon(
    ctx: &ReminderContext,
    today: NaiveDate,
) -> Result<ShortHorizonReport, JobError> {
    let window = short_horizon_window(today);
    tracing::info!(start = %window.start, end = %window.end, "Short-horizon reminder run started");

    let records = ctx.store.list_expiring_between(window.start, window.end).await?;
    let records_found = records.len() as i32;
    let materials: Vec<String> = records.iter().map(|r| r.material_name.clone()).collect();

    let mut recipient_count = 0;
    let mut emails_sent = 0;
    let mut emails_failed = 0;

    if !records.is_empty() {
        let recipients =
            resolve_distribution_list(ctx.store.as_ref(), &ctx.fallback_recipients).await;
        recipient_count = recipients.len() as i32;

        let items: Vec<DispatchItem> = records
            .iter()
            .map(|record| {
                let composed = compose_short_horizon(record, today, &ctx.portal_url);
                DispatchItem {
                    email: OutboundEmail {
                        to: recipients.clone(),
                        subject: composed.subject,
                        html_body: composed.html_body,
                    },
                    record_count: 1,
                    details: serde_json::json!({
                        "record_id": record.id,
                        "material": record.material_name,
                        "expire_date": record.expire_date,
                    }),
                }
            })
            .collect();

        let sink = EmailLogSink { store: ctx.store.as_ref(), action: ACTION_EXPIRY_ALERT };
        let outcomes = send_concurrent(ctx.mailer.as_ref(), items, &sink).await;
        let summary = summarize(&outcomes);
        emails_sent = summary.sent;
        emails_failed = summary.failed;
    }

    if let Err(e) = ctx.store.touch_reminder_checked(window.start, window.end).await {
        tracing::warn!(error = %e, "Failed to stamp reminder_checked_at on scanned records");
    }

    let result = format!(
        "{records_found} expiring records, {emails_sent} emails sent, {emails_failed} failed"
    );

    let run_log = NewCronLog {
        job_name: JOB_SHORT_HORIZON.to_string(),
        status: "completed".to_string(),
        records_found,
        emails_sent,
        emails_failed,
        details: Some(serde_json::json!({
            "window": { "start": window.start, "end": window.end },
            "materials": materials,
            "recipient_count": recipient_count,
            "result": result,
        })),
        error_details: None,
    };
    if let Err(e) = ctx.store.insert_cron_log(&run_log).await {
        tracing::warn!(error = %e, "Failed to write cron log entry");
    }

    tracing::info!(records_found, emails_sent, emails_failed, "Short-horizon reminder run finished");

    Ok(ShortHorizonReport {
        records_found,
        materials,
        recipient_count,
        emails_sent,
        emails_failed,
        result,
    })
}

// ---------------------------------------------------------------------------
// Monthly-milestone run
// ---------------------------------------------------------------------------

/// Run the monthly-milestone job: classify every document expiring within
/// the next three months against its report-date anniversaries, group the
/// matches by owning user, and send one paced digest per owner.
pub async fn run_monthly_milestones(
    ctx: &ReminderContext,
    today: NaiveDate,
) -> Result<MonthlyReport, JobError> {
    let outer = monthly_outer_window(today);
    tracing::info!(start = %outer.start, end = %outer.end, "Monthly milestone run started");

    let records = ctx.store.list_expiring_between(outer.start, outer.end).await?;
    let records_found = records.len() as i32;

    let mut breakdown = MilestoneBreakdown::default();
    let mut entries: Vec<BucketedRecord> = Vec::new();
    for record in records {
        let bucket = classify(record.report_date, record.expire_date);
        breakdown.tally(bucket);
        if bucket.months().is_some() {
            entries.push(BucketedRecord { record, bucket });
        }
    }
    let milestone_records = entries.len() as i32;

    let groups = group_by_owner(entries);
    let recipient_count = groups.len() as i32;

    let items: Vec<DispatchItem> = groups
        .iter()
        .map(|group| {
            let composed = compose_milestone_digest(group, &ctx.portal_url);
            let materials: Vec<&str> = group
                .entries
                .iter()
                .map(|e| e.record.material_name.as_str())
                .collect();
            DispatchItem {
                email: OutboundEmail {
                    to: vec![group.email.clone()],
                    subject: composed.subject,
                    html_body: composed.html_body,
                },
                record_count: group.entries.len() as i32,
                details: serde_json::json!({
                    "user_id": group.user_id,
                    "materials": materials,
                }),
            }
        })
        .collect();

    let sink = EmailLogSink { store: ctx.store.as_ref(), action: ACTION_MILESTONE_DIGEST };
    let outcomes = send_sequential(ctx.mailer.as_ref(), items, ctx.pacing, &sink).await;
    let summary = summarize(&outcomes);

    if let Err(e) = ctx.store.touch_reminder_checked(outer.start, outer.end).await {
        tracing::warn!(error = %e, "Failed to stamp reminder_checked_at on scanned records");
    }

    let result = format!(
        "{milestone_records} milestone records across {recipient_count} recipients, \
         {} emails sent, {} failed",
        summary.sent, summary.failed
    );

    let run_log = NewCronLog {
        job_name: JOB_MONTHLY.to_string(),
        status: "completed".to_string(),
        records_found,
        emails_sent: summary.sent,
        emails_failed: summary.failed,
        details: Some(serde_json::json!({
            "window": { "start": outer.start, "end": outer.end },
            "breakdown": breakdown,
            "recipient_count": recipient_count,
            "result": result,
        })),
        error_details: None,
    };
    if let Err(e) = ctx.store.insert_cron_log(&run_log).await {
        tracing::warn!(error = %e, "Failed to write cron log entry");
    }

    tracing::info!(
        records_found,
        milestone_records,
        emails_sent = summary.sent,
        emails_failed = summary.failed,
        "Monthly milestone run finished"
    );

    Ok(MonthlyReport {
        records_found,
        milestone_records,
        recipient_count,
        emails_sent: summary.sent,
        emails_failed: summary.failed,
        breakdown,
        result,
    })
}

// ---------------------------------------------------------------------------
// Failure bookkeeping
// ---------------------------------------------------------------------------

/// Best-effort "failed" `cron_logs` row for a run that aborted before its
/// own audit write. Used by the HTTP layer's top-level error path.
pub async fn record_failed_run(store: &dyn ReminderStore, job_name: &str, error: &str) {
    let log = NewCronLog {
        job_name: job_name.to_string(),
        status: "failed".to_string(),
        records_found: 0,
        emails_sent: 0,
        emails_failed: 0,
        details: None,
        error_details: Some(error.to_string()),
    };
    if let Err(e) = store.insert_cron_log(&log).await {
        tracing::warn!(error = %e, job_name, "Failed to write failure cron log entry");
    }
}

/// Send a single diagnostic email outside the normal dispatch path.
pub async fn send_test_email(
    ctx: &ReminderContext,
    recipient: &str,
) -> Result<String, crate::mailer::MailError> {
    let email = OutboundEmail {
        to: vec![recipient.to_string()],
        subject: "[Portal Dokumen] Test email".to_string(),
        html_body: "<p>Konfigurasi email Portal Dokumen berfungsi.</p>".to_string(),
    };
    ctx.mailer.send(&email).await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::NaiveDate;

    use dokuportal_db::models::DocumentRecord;

    use crate::mailer::MailError;
    use crate::store::testing::MemoryStore;

    use super::*;

    /// Transport that fails on scripted attempt numbers (1-based).
    struct ScriptedMailer {
        calls: AtomicUsize,
        fail_on: Vec<usize>,
    }

    impl ScriptedMailer {
        fn new(fail_on: Vec<usize>) -> Self {
            Self { calls: AtomicUsize::new(0), fail_on }
        }
    }

    #[async_trait]
    impl Mailer for ScriptedMailer {
        async fn send(&self, _mail: &OutboundEmail) -> Result<String, MailError> {
            let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.fail_on.contains(&attempt) {
                Err(MailError::Build(format!("scripted failure #{attempt}")))
            } else {
                Ok(format!("msg-{attempt}"))
            }
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn record(id: i64, owner: (i64, &str), report: NaiveDate, expire: NaiveDate) -> DocumentRecord {
        DocumentRecord {
            id,
            material_name: format!("SPHC-{id}"),
            report_date: Some(report),
            expire_date: expire,
            is_active: true,
            owner_user_id: Some(owner.0),
            owner_email: Some(owner.1.to_string()),
            supplier_name: None,
            part_name: None,
            part_number_name: None,
            document_type_name: None,
        }
    }

    fn context(store: Arc<MemoryStore>, mailer: Arc<dyn Mailer>) -> ReminderContext {
        ReminderContext {
            store,
            mailer,
            pacing: Duration::ZERO,
            fallback_recipients: vec!["fb@example.com".to_string()],
            portal_url: "https://portal.example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn zero_match_short_horizon_run_completes_with_one_audit_row() {
        let store = Arc::new(MemoryStore::default());
        let ctx = context(store.clone(), Arc::new(ScriptedMailer::new(vec![1])));

        let report = run_short_horizon(&ctx, d(2024, 1, 15)).await.unwrap();

        assert_eq!(report.records_found, 0);
        assert_eq!(report.emails_sent, 0);
        assert_eq!(report.emails_failed, 0);

        // No sends, no per-send rows, exactly one completed run entry.
        assert!(store.email_logs.lock().unwrap().is_empty());
        let cron = store.cron_logs.lock().unwrap();
        assert_eq!(cron.len(), 1);
        assert_eq!(cron[0].job_name, JOB_SHORT_HORIZON);
        assert_eq!(cron[0].status, "completed");
        assert_eq!(cron[0].emails_sent, 0);
    }

    #[tokio::test]
    async fn short_horizon_sends_each_record_to_the_distribution_list() {
        let store = Arc::new(MemoryStore {
            records: vec![
                record(1, (10, "a@example.com"), d(2024, 1, 1), d(2024, 1, 16)),
                record(2, (20, "b@example.com"), d(2024, 1, 1), d(2024, 1, 17)),
            ],
            recipients: vec!["admin@example.com".to_string()],
            ..Default::default()
        });
        let ctx = context(store.clone(), Arc::new(ScriptedMailer::new(vec![])));

        let report = run_short_horizon(&ctx, d(2024, 1, 15)).await.unwrap();

        assert_eq!(report.records_found, 2);
        assert_eq!(report.emails_sent, 2);
        assert_eq!(report.recipient_count, 2); // admin + fallback
        assert_eq!(report.materials, vec!["SPHC-1", "SPHC-2"]);

        let emails = store.email_logs.lock().unwrap();
        assert_eq!(emails.len(), 2);
        assert!(emails.iter().all(|l| l.action == "expiry_alert"));
        assert!(emails[0].recipient.contains("admin@example.com"));
        assert!(emails[0].recipient.contains("fb@example.com"));

        // The scanned window was stamped once.
        let touched = store.touched_windows.lock().unwrap();
        assert_eq!(*touched, vec![(d(2024, 1, 15), d(2024, 1, 18))]);
    }

    #[tokio::test]
    async fn monthly_run_absorbs_failures_and_logs_every_recipient() {
        // Five owners, one record each, all exactly on the 3-month target.
        let report_date = d(2024, 1, 1);
        let expire = d(2024, 4, 1);
        let store = Arc::new(MemoryStore {
            records: (1..=5)
                .map(|i| {
                    let email = format!("user{i}@example.com");
                    record(i, (i * 10, email.as_str()), report_date, expire)
                })
                .collect(),
            ..Default::default()
        });
        let ctx = context(store.clone(), Arc::new(ScriptedMailer::new(vec![3])));

        let report = run_monthly_milestones(&ctx, d(2024, 1, 15)).await.unwrap();

        assert_eq!(report.records_found, 5);
        assert_eq!(report.milestone_records, 5);
        assert_eq!(report.recipient_count, 5);
        assert_eq!(report.emails_sent, 4);
        assert_eq!(report.emails_failed, 1);
        assert_eq!(report.breakdown.three_months, 5);

        // One per-send row per recipient plus one run-level entry.
        let emails = store.email_logs.lock().unwrap();
        assert_eq!(emails.len(), 5);
        assert_eq!(emails.iter().map(|l| l.sent_count).sum::<i32>(), 4);
        assert_eq!(emails.iter().map(|l| l.failed_count).sum::<i32>(), 1);
        assert_eq!(emails[2].failed_count, 1);
        assert!(emails[2]
            .details
            .as_ref()
            .map(|details| details.get("error").is_some())
            .unwrap_or(false));

        let cron = store.cron_logs.lock().unwrap();
        assert_eq!(cron.len(), 1);
        assert_eq!(cron[0].job_name, JOB_MONTHLY);
        assert_eq!(cron[0].status, "completed");
        assert_eq!(cron[0].emails_sent, 4);
        assert_eq!(cron[0].emails_failed, 1);
    }

    #[tokio::test]
    async fn failed_run_writes_a_failed_cron_row() {
        let store = MemoryStore::default();

        record_failed_run(&store, JOB_SHORT_HORIZON, "connection refused").await;

        let cron = store.cron_logs.lock().unwrap();
        assert_eq!(cron.len(), 1);
        assert_eq!(cron[0].status, "failed");
        assert_eq!(cron[0].error_details.as_deref(), Some("connection refused"));
    }

    #[test]
    fn breakdown_tallies_each_bucket_once() {
        let mut breakdown = MilestoneBreakdown::default();
        breakdown.tally(MilestoneBucket::ThreeMonths);
        breakdown.tally(MilestoneBucket::ThreeMonths);
        breakdown.tally(MilestoneBucket::OneMonth);
        breakdown.tally(MilestoneBucket::Other);

        assert_eq!(
            breakdown,
            MilestoneBreakdown { three_months: 2, two_months: 0, one_month: 1, other: 1 }
        );
    }

    #[test]
    fn breakdown_serializes_with_snake_case_keys() {
        let breakdown = MilestoneBreakdown { three_months: 1, two_months: 2, one_month: 3, other: 4 };
        let json = serde_json::to_value(breakdown).expect("serialize breakdown");
        assert_eq!(json["three_months"], 1);
        assert_eq!(json["other"], 4);
    }
}
