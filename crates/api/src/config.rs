//! Server configuration loaded from environment variables.

use std::time::Duration;

/// Default scheduler user-agent signature accepted by the trigger gate.
const DEFAULT_CRON_USER_AGENT: &str = "vercel-cron/1.0";

/// Default fixed inter-send delay for the monthly dispatch loop.
const DEFAULT_PACING_SECS: u64 = 5;

/// Server configuration loaded from environment variables.
///
/// All fields except `CRON_SECRET` have defaults suitable for local
/// development. In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Shared secret accepted as `Authorization: Bearer <secret>` on the
    /// reminder trigger endpoints.
    pub cron_secret: String,
    /// User-agent prefix identifying the external scheduler.
    pub cron_user_agent: String,
    /// Fixed inter-send delay for the sequential monthly loop.
    pub reminder_pacing: Duration,
    /// Fallback distribution list for the short-horizon job, used when the
    /// admin/manager role query fails or comes back empty.
    pub fallback_recipients: Vec<String>,
    /// Public base URL of the portal (used in email footers/links).
    pub app_base_url: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `CRON_SECRET`          | — (required)               |
    /// | `CRON_USER_AGENT`      | `vercel-cron/1.0`          |
    /// | `REMINDER_PACING_SECS` | `5`                        |
    /// | `FALLBACK_RECIPIENTS`  | (empty)                    |
    /// | `APP_BASE_URL`         | `http://localhost:3000`    |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let cron_secret = std::env::var("CRON_SECRET").expect("CRON_SECRET must be set");

        let cron_user_agent = std::env::var("CRON_USER_AGENT")
            .unwrap_or_else(|_| DEFAULT_CRON_USER_AGENT.into());

        let pacing_secs: u64 = std::env::var("REMINDER_PACING_SECS")
            .unwrap_or_else(|_| DEFAULT_PACING_SECS.to_string())
            .parse()
            .expect("REMINDER_PACING_SECS must be a valid u64");

        let fallback_recipients: Vec<String> = std::env::var("FALLBACK_RECIPIENTS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let app_base_url = std::env::var("APP_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000".into());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            cron_secret,
            cron_user_agent,
            reminder_pacing: Duration::from_secs(pacing_secs),
            fallback_recipients,
            app_base_url,
        }
    }
}
