//! Outbound mail transport seam.
//!
//! Both reminder jobs send through the [`Mailer`] trait so the dispatch
//! loop can be exercised with a scripted fake in tests. Production wiring
//! picks [`api::ApiMailer`] when a transactional API key is configured and
//! falls back to [`smtp::SmtpMailer`] otherwise.

use async_trait::async_trait;

pub mod api;
pub mod smtp;

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for outbound mail failures.
#[derive(Debug, thiserror::Error)]
pub enum MailError {
    /// SMTP transport-level failure (authentication, connection, etc.).
    #[error("SMTP transport error: {0}")]
    Transport(#[from] lettre::transport::smtp::Error),

    /// The recipient or sender address could not be parsed.
    #[error("Email address parse error: {0}")]
    Address(#[from] lettre::address::AddressError),

    /// The MIME message could not be assembled.
    #[error("Email build error: {0}")]
    Build(String),

    /// The HTTP request to the transactional email API failed.
    #[error("Email API request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The transactional email API rejected the send.
    #[error("Email API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
}

// ---------------------------------------------------------------------------
// OutboundEmail / Mailer
// ---------------------------------------------------------------------------

/// A fully composed message ready for a transport.
///
/// The short-horizon job addresses one message per record to the entire
/// distribution list, so `to` is a list; the monthly digest always has a
/// single recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundEmail {
    pub to: Vec<String>,
    pub subject: String,
    pub html_body: String,
}

impl OutboundEmail {
    /// Recipients joined for logging and audit rows.
    pub fn recipient_label(&self) -> String {
        self.to.join(", ")
    }
}

/// Transport abstraction over SMTP and the transactional email API.
///
/// `send` returns the provider's message identifier on success.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &OutboundEmail) -> Result<String, MailError>;
}
