//! Dispatch loops: sequential-with-pacing and concurrent fan-out.
//!
//! A send failure never aborts a loop; it is caught, embedded in the
//! [`DispatchOutcome`], and tallied. The sequential loop sleeps for a fixed
//! pacing interval between attempts, success or failure alike, to stay
//! under outbound-mail rate limits.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;

use crate::mailer::{MailError, Mailer, OutboundEmail};

/// One message queued for dispatch, with the number of document records it
/// covers and a free-form audit payload (material names etc.).
#[derive(Debug, Clone)]
pub struct DispatchItem {
    pub email: OutboundEmail,
    pub record_count: i32,
    pub details: serde_json::Value,
}

/// The result of one send attempt.
#[derive(Debug)]
pub struct DispatchOutcome {
    pub recipient: String,
    pub record_count: i32,
    pub details: serde_json::Value,
    /// Provider message id on success, the caught error on failure.
    pub result: Result<String, MailError>,
}

/// Run-level success/failure counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub sent: i32,
    pub failed: i32,
}

/// Tally outcomes into run-level counters.
pub fn summarize(outcomes: &[DispatchOutcome]) -> DispatchSummary {
    let mut summary = DispatchSummary::default();
    for outcome in outcomes {
        match outcome.result {
            Ok(_) => summary.sent += 1,
            Err(_) => summary.failed += 1,
        }
    }
    summary
}

/// Receives each outcome as soon as its attempt finishes.
///
/// The jobs write an `email_logs` row per outcome; tests collect them.
/// Implementations must absorb their own failures: recording never affects
/// the dispatch loop.
#[async_trait]
pub trait OutcomeSink: Send + Sync {
    async fn record(&self, outcome: &DispatchOutcome);
}

/// A sink that drops outcomes (used by diagnostic sends).
pub struct NullSink;

#[async_trait]
impl OutcomeSink for NullSink {
    async fn record(&self, _outcome: &DispatchOutcome) {}
}

/// Send items one at a time, recording each outcome and then sleeping for
/// the fixed `pacing` interval before the next attempt.
///
/// The delay is skipped after the final item. Outcomes come back in input
/// order.
pub async fn send_sequential(
    mailer: &dyn Mailer,
    items: Vec<DispatchItem>,
    pacing: Duration,
    sink: &dyn OutcomeSink,
) -> Vec<DispatchOutcome> {
    let total = items.len();
    let mut outcomes = Vec::with_capacity(total);

    for (index, item) in items.into_iter().enumerate() {
        let outcome = attempt(mailer, item).await;
        sink.record(&outcome).await;
        outcomes.push(outcome);

        if index + 1 < total {
            tokio::time::sleep(pacing).await;
        }
    }

    outcomes
}

/// Send all items concurrently with no pacing, recording each outcome as it
/// lands. Outcomes come back in input order.
pub async fn send_concurrent(
    mailer: &dyn Mailer,
    items: Vec<DispatchItem>,
    sink: &dyn OutcomeSink,
) -> Vec<DispatchOutcome> {
    let attempts = items.into_iter().map(|item| async move {
        let outcome = attempt(mailer, item).await;
        sink.record(&outcome).await;
        outcome
    });

    join_all(attempts).await
}

async fn attempt(mailer: &dyn Mailer, item: DispatchItem) -> DispatchOutcome {
    let recipient = item.email.recipient_label();

    let result = mailer.send(&item.email).await;
    match &result {
        Ok(provider_id) => {
            tracing::debug!(recipient = %recipient, provider_id = %provider_id, "Send succeeded");
        }
        Err(e) => {
            tracing::warn!(recipient = %recipient, error = %e, "Send failed, continuing");
        }
    }

    DispatchOutcome {
        recipient,
        record_count: item.record_count,
        details: item.details,
        result,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Fake transport that fails on scripted attempt numbers (1-based).
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

    /// Sink collecting recipient labels in arrival order.
    #[derive(Default)]
    struct CollectingSink {
        recorded: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl OutcomeSink for CollectingSink {
        async fn record(&self, outcome: &DispatchOutcome) {
            self.recorded
                .lock()
                .expect("sink mutex poisoned")
                .push(outcome.recipient.clone());
        }
    }

    fn items(n: usize) -> Vec<DispatchItem> {
        (1..=n)
            .map(|i| DispatchItem {
                email: OutboundEmail {
                    to: vec![format!("user{i}@example.com")],
                    subject: format!("subject {i}"),
                    html_body: "<p>body</p>".to_string(),
                },
                record_count: 1,
                details: serde_json::json!({}),
            })
            .collect()
    }

    #[tokio::test]
    async fn sequential_counts_failures_without_aborting() {
        let mailer = ScriptedMailer::new(vec![3]);
        let sink = CollectingSink::default();

        let outcomes = send_sequential(&mailer, items(5), Duration::ZERO, &sink).await;

        assert_eq!(outcomes.len(), 5);
        let summary = summarize(&outcomes);
        assert_eq!(summary.sent, 4);
        assert_eq!(summary.failed, 1);
        assert!(outcomes[2].result.is_err());

        // One audit record per recipient, in send order.
        let recorded = sink.recorded.lock().unwrap();
        assert_eq!(recorded.len(), 5);
        assert_eq!(recorded[0], "user1@example.com");
        assert_eq!(recorded[4], "user5@example.com");
    }

    #[tokio::test]
    async fn concurrent_preserves_input_order() {
        let mailer = ScriptedMailer::new(vec![]);
        let sink = NullSink;

        let outcomes = send_concurrent(&mailer, items(3), &sink).await;

        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].recipient, "user1@example.com");
        assert_eq!(outcomes[2].recipient, "user3@example.com");
        assert_eq!(summarize(&outcomes), DispatchSummary { sent: 3, failed: 0 });
    }

    #[tokio::test]
    async fn empty_batch_is_a_valid_run() {
        let mailer = ScriptedMailer::new(vec![]);
        let outcomes = send_sequential(&mailer, Vec::new(), Duration::ZERO, &NullSink).await;
        assert!(outcomes.is_empty());
        assert_eq!(summarize(&outcomes), DispatchSummary::default());
    }

    #[tokio::test]
    async fn all_failures_still_complete() {
        let mailer = ScriptedMailer::new(vec![1, 2]);
        let outcomes = send_sequential(&mailer, items(2), Duration::ZERO, &NullSink).await;
        assert_eq!(summarize(&outcomes), DispatchSummary { sent: 0, failed: 2 });
    }
}
