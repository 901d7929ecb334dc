//! One-shot webhook notification for completed jobs.
//!
//! [`WebhookNotifier`] POSTs a JSON-encoded [`CompletionNotice`] to the URL
//! fixed at construction time. Delivery is single-shot: a failed attempt is
//! reported to the caller and never retried.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

/// HTTP request timeout for a delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for webhook delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The remote server returned a non-2xx status code.
    #[error("Webhook returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// Notice payload
// ---------------------------------------------------------------------------

/// Body POSTed to the webhook when a job reaches `completed`.
///
/// Unlike the job resource itself, `payload` is sent decoded so receivers
/// get a ready-to-use object.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionNotice {
    pub job_id: i64,
    pub task_name: String,
    pub priority: String,
    pub payload: Value,
    pub completed_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// WebhookNotifier
// ---------------------------------------------------------------------------

/// Delivers completion notices to the configured webhook endpoint.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: Option<String>,
}

impl WebhookNotifier {
    /// Create a notifier for `url`. `None` disables delivery: every notice
    /// is skipped with a warning instead of failing.
    pub fn new(url: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self { client, url }
    }

    /// POST one completion notice.
    ///
    /// Returns `Ok(())` on any 2xx response, or when no URL is configured.
    pub async fn notify(&self, notice: &CompletionNotice) -> Result<(), NotifyError> {
        let Some(url) = self.url.as_deref() else {
            tracing::warn!(
                job_id = notice.job_id,
                "No webhook URL configured, skipping completion notice"
            );
            return Ok(());
        };

        let response = self.client.post(url).json(notice).send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
