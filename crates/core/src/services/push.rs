//! Push transport.
//!
//! Delivers structured payloads to the mobile back-office app through an
//! HTTP push gateway. Mirrors the SMS transport's config-gated shape.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

use tradehub_common::config::PushConfig;
use tradehub_common::{AppError, AppResult};

/// Structured push payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushPayload {
    /// Notification type, snake_case.
    #[serde(rename = "type")]
    pub notification_type: String,
    /// Notification title.
    pub title: String,
    /// Notification body.
    pub body: String,
    /// Additional data (the event payload).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

/// Outbound push transport.
#[async_trait]
pub trait PushTransport: Send + Sync {
    /// Send one push notification to all of a recipient's devices.
    async fn send_push(&self, recipient_id: &str, payload: &PushPayload) -> AppResult<()>;
}

/// Shared handle to a push transport.
pub type PushService = Arc<dyn PushTransport>;

/// Build the configured push transport. `None` when the push channel is
/// disabled in configuration.
#[must_use]
pub fn build_push_transport(config: &PushConfig) -> Option<PushService> {
    if !config.enabled {
        return None;
    }
    Some(Arc::new(HttpPushGateway::new(config.clone())))
}

/// HTTP gateway push sender.
#[derive(Clone)]
pub struct HttpPushGateway {
    config: PushConfig,
    http_client: reqwest::Client,
}

impl HttpPushGateway {
    /// Create a gateway sender from configuration.
    #[must_use]
    pub fn new(config: PushConfig) -> Self {
        Self {
            config,
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl PushTransport for HttpPushGateway {
    async fn send_push(&self, recipient_id: &str, payload: &PushPayload) -> AppResult<()> {
        let Some(gateway_url) = &self.config.gateway_url else {
            tracing::info!(recipient_id = %recipient_id, "Would send push (no gateway configured)");
            return Ok(());
        };

        let mut request = self.http_client.post(gateway_url).json(&serde_json::json!({
            "recipientId": recipient_id,
            "payload": payload,
        }));
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("push gateway request failed: {e}")))?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            Err(AppError::ExternalService(format!(
                "push gateway rejected message ({status}): {error_text}"
            )))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn disabled_config_builds_no_transport() {
        assert!(build_push_transport(&PushConfig::default()).is_none());
    }

    #[test]
    fn payload_serializes_with_type_key() {
        let payload = PushPayload {
            notification_type: "order_comment".to_string(),
            title: "New comment".to_string(),
            body: "Someone commented".to_string(),
            data: None,
        };

        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["type"], "order_comment");
        assert!(value.get("data").is_none());
    }

    #[tokio::test]
    async fn gateway_without_url_reports_success() {
        let transport = HttpPushGateway::new(PushConfig {
            enabled: true,
            gateway_url: None,
            api_key: None,
        });

        let payload = PushPayload {
            notification_type: "security".to_string(),
            title: "t".to_string(),
            body: "b".to_string(),
            data: None,
        };
        assert!(transport.send_push("u1", &payload).await.is_ok());
    }
}
