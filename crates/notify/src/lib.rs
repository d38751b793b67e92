//! Outbound notification infrastructure for the reminder jobs.
//!
//! Building blocks, leaf first:
//!
//! - [`mailer`] — the [`Mailer`] transport seam with SMTP ([`SmtpMailer`])
//!   and transactional-API ([`ApiMailer`]) implementations.
//! - [`compose`] — deterministic subject/HTML rendering for both jobs.
//! - [`store`] — the [`ReminderStore`] persistence seam with the
//!   production [`PgStore`] over the sqlx repositories.
//! - [`recipients`] — owner grouping and distribution-list resolution.
//! - [`dispatch`] — sequential paced and concurrent send loops with
//!   per-item failure accounting.
//! - [`jobs`] — the two job entry points wiring everything together and
//!   writing the audit trail.

pub mod compose;
pub mod dispatch;
pub mod jobs;
pub mod mailer;
pub mod recipients;
pub mod store;

pub use dispatch::{DispatchOutcome, DispatchSummary};
pub use jobs::{MonthlyReport, ReminderContext, ShortHorizonReport};
pub use store::{PgStore, ReminderStore};
pub use mailer::api::{ApiMailer, ApiMailerConfig};
pub use mailer::smtp::{SmtpConfig, SmtpMailer};
pub use mailer::{MailError, Mailer, OutboundEmail};
