//! SMS transport.
//!
//! Sends through a generic HTTP gateway when one is configured; without a
//! gateway URL the transport logs the would-send and reports success, which
//! keeps local environments working end to end.

use async_trait::async_trait;
use std::sync::Arc;

use tradehub_common::config::SmsConfig;
use tradehub_common::{AppError, AppResult};

/// Outbound SMS transport.
#[async_trait]
pub trait SmsTransport: Send + Sync {
    /// Send one SMS. Body is plain text, already truncated by the caller.
    async fn send_sms(&self, to: &str, body: &str) -> AppResult<()>;
}

/// Shared handle to an SMS transport.
pub type SmsService = Arc<dyn SmsTransport>;

/// Build the configured SMS transport. `None` when the SMS channel is
/// disabled in configuration.
#[must_use]
pub fn build_sms_transport(config: &SmsConfig) -> Option<SmsService> {
    if !config.enabled {
        return None;
    }
    Some(Arc::new(HttpSmsGateway::new(config.clone())))
}

/// HTTP gateway SMS sender.
#[derive(Clone)]
pub struct HttpSmsGateway {
    config: SmsConfig,
    http_client: reqwest::Client,
}

impl HttpSmsGateway {
    /// Create a gateway sender from configuration.
    #[must_use]
    pub fn new(config: SmsConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl SmsTransport for HttpSmsGateway {
    async fn send_sms(&self, to: &str, body: &str) -> AppResult<()> {
        let Some(gateway_url) = &self.config.gateway_url else {
            tracing::info!(to = %to, "Would send SMS (no gateway configured)");
            return Ok(());
        };

        let mut request = self.http_client.post(gateway_url).json(&serde_json::json!({
            "to": to,
            "body": body,
            "senderId": self.config.sender_id,
        }));
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("SMS gateway request failed: {e}")))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            Err(AppError::ExternalService(format!(
                "SMS gateway rejected message ({status}): {error_text}"
            )))
        }
    }
}
