//! Transactional email API transport.
//!
//! Sends through an HTTP JSON endpoint (`POST {url}` with a bearer key)
//! instead of SMTP. The short-horizon job prefers this transport when
//! `EMAIL_API_KEY` is configured. There is deliberately no retry here; the
//! dispatch loop records failures and moves on.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use super::{MailError, Mailer, OutboundEmail};

/// HTTP request timeout for a single send attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Default API endpoint when `EMAIL_API_URL` is not set.
const DEFAULT_API_URL: &str = "https://api.resend.com/emails";

/// Default sender when `EMAIL_API_FROM` is not set.
const DEFAULT_FROM_ADDRESS: &str = "noreply@dokuportal.local";

// ---------------------------------------------------------------------------
// ApiMailerConfig
// ---------------------------------------------------------------------------

/// Configuration for the transactional email API transport.
#[derive(Debug, Clone)]
pub struct ApiMailerConfig {
    /// API endpoint URL.
    pub url: String,
    /// Bearer API key.
    pub api_key: String,
    /// Sender address.
    pub from_address: String,
}

impl ApiMailerConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `EMAIL_API_KEY` is not set.
    ///
    /// | Variable         | Required | Default                         |
    /// |------------------|----------|---------------------------------|
    /// | `EMAIL_API_KEY`  | yes      | —                               |
    /// | `EMAIL_API_URL`  | no       | `https://api.resend.com/emails` |
    /// | `EMAIL_API_FROM` | no       | `noreply@dokuportal.local`      |
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("EMAIL_API_KEY").ok()?;
        Some(Self {
            url: std::env::var("EMAIL_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            api_key,
            from_address: std::env::var("EMAIL_API_FROM")
                .unwrap_or_else(|_| DEFAULT_FROM_ADDRESS.to_string()),
        })
    }
}

// ---------------------------------------------------------------------------
// ApiMailer
// ---------------------------------------------------------------------------

/// Response body of a successful API send.
#[derive(Debug, Deserialize)]
struct ApiSendResponse {
    id: Option<String>,
}

/// Sends HTML reminder emails through the transactional email API.
pub struct ApiMailer {
    config: ApiMailerConfig,
    client: reqwest::Client,
}

impl ApiMailer {
    /// Create a transport with a pre-configured HTTP client.
    pub fn new(config: ApiMailerConfig) -> Result<Self, MailError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl Mailer for ApiMailer {
    async fn send(&self, mail: &OutboundEmail) -> Result<String, MailError> {
        let payload = serde_json::json!({
            "from": self.config.from_address,
            "to": mail.to,
            "subject": mail.subject,
            "html": mail.html_body,
        });

        let response = self
            .client
            .post(&self.config.url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Api { status: status.as_u16(), body });
        }

        let parsed: ApiSendResponse = response.json().await.unwrap_or(ApiSendResponse { id: None });
        let provider_id = parsed.id.unwrap_or_else(|| "accepted".to_string());

        tracing::info!(to = %mail.recipient_label(), subject = %mail.subject,
            provider_id = %provider_id, "Reminder email sent via API");
        Ok(provider_id)
    }
}
