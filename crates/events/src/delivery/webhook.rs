//! Operator webhook delivery with exponential-backoff retry.
//!
//! [`WebhookDelivery`] POSTs a JSON-encoded [`PreviewEvent`] to the configured
//! URL. When a secret is configured the body is signed with HMAC-SHA256 and
//! the hex digest sent in [`SIGNATURE_HEADER`]. Failed attempts are retried
//! three times (1 s, 2 s, 4 s).

use std::time::Duration;

use cadenza_core::hashing::hmac_sha256_hex;

use crate::event::PreviewEvent;

/// Retry delays in seconds (exponential backoff: 1s, 2s, 4s).
const RETRY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Carries `sha256=<hex hmac of the body>`.
pub const SIGNATURE_HEADER: &str = "X-Cadenza-Signature";

/// Carries the event type.
pub const EVENT_HEADER: &str = "X-Cadenza-Event";

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),

    #[error("Event could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Webhook URL is not configured")]
    NotConfigured,
}

// ---------------------------------------------------------------------------
// WebhookConfig
// ---------------------------------------------------------------------------

/// Explicit webhook settings, handed to the notifier at construction.
#[derive(Debug, Clone, Default)]
pub struct WebhookConfig {
    pub webhook_url: Option<String>,
    pub secret: Option<String>,
    pub enabled: bool,
}

impl WebhookConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable                 | Default |
    /// |--------------------------|---------|
    /// | `NOTIFY_WEBHOOK_URL`     | unset   |
    /// | `NOTIFY_WEBHOOK_SECRET`  | unset   |
    /// | `NOTIFY_WEBHOOK_ENABLED` | `true`  |
    pub fn from_env() -> Self {
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            webhook_url: non_empty("NOTIFY_WEBHOOK_URL"),
            secret: non_empty("NOTIFY_WEBHOOK_SECRET"),
            enabled: std::env::var("NOTIFY_WEBHOOK_ENABLED")
                .map(|v| !matches!(v.trim().to_ascii_lowercase().as_str(), "false" | "0" | "no"))
                .unwrap_or(true),
        }
    }

    /// Enabled and pointing somewhere.
    pub fn is_active(&self) -> bool {
        self.enabled && self.webhook_url.is_some()
    }
}

/// `sha256=<hex>` signature of `body` under `secret`.
pub fn sign_payload(secret: &str, body: &[u8]) -> String {
    format!("sha256={}", hmac_sha256_hex(secret, body))
}

// ---------------------------------------------------------------------------
// WebhookDelivery
// ---------------------------------------------------------------------------

pub struct WebhookDelivery {
    client: reqwest::Client,
    config: WebhookConfig,
    retry_delays: Vec<Duration>,
}

impl WebhookDelivery {
    pub fn new(config: WebhookConfig) -> Result<Self, WebhookError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            config,
            retry_delays: RETRY_DELAYS_SECS.iter().map(|s| Duration::from_secs(*s)).collect(),
        })
    }

    /// Override the backoff schedule. One retry per entry.
    pub fn with_retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = delays;
        self
    }

    pub fn config(&self) -> &WebhookConfig {
        &self.config
    }

    /// Deliver `event`, retrying up to 3 times with exponential backoff.
    pub async fn deliver(&self, event: &PreviewEvent) -> Result<(), WebhookError> {
        let url = self
            .config
            .webhook_url
            .as_deref()
            .ok_or(WebhookError::NotConfigured)?;
        let body = serde_json::to_vec(event)?;

        for (attempt, delay) in self.retry_delays.iter().enumerate() {
            match self.try_send(url, &event.event_type, &body).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        url,
                        event_type = %event.event_type,
                        error = %e,
                        "Webhook delivery attempt failed, retrying"
                    );
                    tokio::time::sleep(*delay).await;
                }
            }
        }

        // Final attempt after the last backoff.
        match self.try_send(url, &event.event_type, &body).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!(url, event_type = %event.event_type, error = %e, "Webhook delivery failed after all retries");
                Err(e)
            }
        }
    }

    /// Execute a single POST request and check the response status.
    async fn try_send(&self, url: &str, event_type: &str, body: &[u8]) -> Result<(), WebhookError> {
        let mut request = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(EVENT_HEADER, event_type)
            .body(body.to_vec());

        if let Some(secret) = &self.config.secret {
            request = request.header(SIGNATURE_HEADER, sign_payload(secret, body));
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(WebhookError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
