//! Email transport.
//!
//! One trait, three providers: SMTP via lettre, SendGrid and Mailgun via
//! their HTTP APIs. The delivery coordinator only sees the trait.

use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use tradehub_common::config::{EmailConfig, MailgunSettings, SendGridSettings, SmtpSettings};
use tradehub_common::{AppError, AppResult};

/// A rendered email ready for a transport.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    /// Recipient address.
    pub to: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body.
    pub text_body: String,
    /// HTML body.
    pub html_body: Option<String>,
}

/// Outcome of one transport call.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailDeliveryResult {
    /// Whether the provider accepted the message.
    pub success: bool,
    /// Provider message ID, when reported.
    pub message_id: Option<String>,
    /// Provider rejection reason, when reported.
    pub error: Option<String>,
}

/// Outbound email transport.
#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Send one email. `Err` means the transport itself was unreachable; a
    /// provider-side rejection comes back as `success == false`.
    async fn send_email(&self, message: EmailMessage) -> AppResult<EmailDeliveryResult>;
}

/// Shared handle to an email transport.
pub type EmailService = Arc<dyn EmailTransport>;

/// Build the configured email transport. `None` when the email channel is
/// disabled in configuration.
pub fn build_email_transport(config: &EmailConfig) -> AppResult<Option<EmailService>> {
    if !config.enabled {
        return Ok(None);
    }

    let transport: EmailService = match config.provider.as_str() {
        "smtp" => {
            let settings = config
                .smtp
                .as_ref()
                .ok_or_else(|| AppError::Config("email.smtp settings missing".to_string()))?;
            Arc::new(SmtpMailer::new(settings, config)?)
        }
        "sendgrid" => {
            let settings = config
                .sendgrid
                .as_ref()
                .ok_or_else(|| AppError::Config("email.sendgrid settings missing".to_string()))?;
            Arc::new(SendGridMailer::new(settings.clone(), config))
        }
        "mailgun" => {
            let settings = config
                .mailgun
                .as_ref()
                .ok_or_else(|| AppError::Config("email.mailgun settings missing".to_string()))?;
            Arc::new(MailgunMailer::new(settings.clone(), config))
        }
        other => {
            return Err(AppError::Config(format!("unknown email provider: {other}")));
        }
    };

    Ok(Some(transport))
}

/// SMTP transport via lettre.
#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    reply_to: Option<Mailbox>,
}

impl SmtpMailer {
    /// Build an SMTP relay transport from settings.
    pub fn new(settings: &SmtpSettings, config: &EmailConfig) -> AppResult<Self> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)
            .map_err(|e| AppError::Config(format!("invalid SMTP relay: {e}")))?
            .port(settings.port);

        if let (Some(username), Some(password)) = (&settings.username, &settings.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let from = parse_mailbox(&config.from_name, &config.from_address)?;
        let reply_to = config
            .reply_to
            .as_deref()
            .map(|address| parse_mailbox(&config.from_name, address))
            .transpose()?;

        Ok(Self {
            transport: builder.build(),
            from,
            reply_to,
        })
    }
}

fn parse_mailbox(name: &str, address: &str) -> AppResult<Mailbox> {
    format!("{name} <{address}>")
        .parse()
        .map_err(|e| AppError::Config(format!("invalid email address {address}: {e}")))
}

#[async_trait]
impl EmailTransport for SmtpMailer {
    async fn send_email(&self, message: EmailMessage) -> AppResult<EmailDeliveryResult> {
        let to: Mailbox = message
            .to
            .parse()
            .map_err(|e| AppError::Validation(format!("invalid recipient address: {e}")))?;

        let mut builder = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&message.subject);
        if let Some(reply_to) = &self.reply_to {
            builder = builder.reply_to(reply_to.clone());
        }

        let email = match message.html_body {
            Some(html) => builder.multipart(MultiPart::alternative_plain_html(
                message.text_body,
                html,
            )),
            None => builder.body(message.text_body),
        }
        .map_err(|e| AppError::Internal(format!("failed to build email: {e}")))?;

        match self.transport.send(email).await {
            Ok(response) => Ok(EmailDeliveryResult {
                success: response.is_positive(),
                message_id: None,
                error: None,
            }),
            Err(e) => Err(AppError::ExternalService(format!("SMTP send failed: {e}"))),
        }
    }
}

/// `SendGrid` transport via the v3 mail API.
#[derive(Clone)]
pub struct SendGridMailer {
    settings: SendGridSettings,
    from_address: String,
    from_name: String,
    http_client: reqwest::Client,
}

impl SendGridMailer {
    /// Create a `SendGrid` transport.
    #[must_use]
    pub fn new(settings: SendGridSettings, config: &EmailConfig) -> Self {
        Self {
            settings,
            from_address: config.from_address.clone(),
            from_name: config.from_name.clone(),
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl EmailTransport for SendGridMailer {
    async fn send_email(&self, message: EmailMessage) -> AppResult<EmailDeliveryResult> {
        let body = serde_json::json!({
            "personalizations": [{
                "to": [{"email": message.to}]
            }],
            "from": {
                "email": self.from_address,
                "name": self.from_name
            },
            "subject": message.subject,
            "content": [
                {"type": "text/plain", "value": message.text_body},
                {"type": "text/html", "value": message.html_body.unwrap_or_default()}
            ]
        });

        let response = self
            .http_client
            .post("https://api.sendgrid.com/v3/mail/send")
            .header("Authorization", format!("Bearer {}", self.settings.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("SendGrid request failed: {e}")))?;

        if response.status().is_success() {
            let message_id = response
                .headers()
                .get("X-Message-Id")
                .and_then(|v| v.to_str().ok())
                .map(String::from);
            Ok(EmailDeliveryResult {
                success: true,
                message_id,
                error: None,
            })
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Ok(EmailDeliveryResult {
                success: false,
                message_id: None,
                error: Some(error_text),
            })
        }
    }
}

/// Mailgun transport via the v3 messages API.
#[derive(Clone)]
pub struct MailgunMailer {
    settings: MailgunSettings,
    from_address: String,
    from_name: String,
    http_client: reqwest::Client,
}

impl MailgunMailer {
    /// Create a Mailgun transport.
    #[must_use]
    pub fn new(settings: MailgunSettings, config: &EmailConfig) -> Self {
        Self {
            settings,
            from_address: config.from_address.clone(),
            from_name: config.from_name.clone(),
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl EmailTransport for MailgunMailer {
    async fn send_email(&self, message: EmailMessage) -> AppResult<EmailDeliveryResult> {
        let mut form_params = vec![
            (
                "from",
                format!("{} <{}>", self.from_name, self.from_address),
            ),
            ("to", message.to),
            ("subject", message.subject),
            ("text", message.text_body),
        ];
        if let Some(html) = message.html_body {
            form_params.push(("html", html));
        }

        let response = self
            .http_client
            .post(format!(
                "https://api.mailgun.net/v3/{}/messages",
                self.settings.domain
            ))
            .basic_auth("api", Some(&self.settings.api_key))
            .form(&form_params)
            .send()
            .await
            .map_err(|e| AppError::ExternalService(format!("Mailgun request failed: {e}")))?;

        if response.status().is_success() {
            #[derive(Deserialize)]
            struct MailgunResponse {
                id: Option<String>,
            }
            let result: MailgunResponse = response
                .json()
                .await
                .unwrap_or(MailgunResponse { id: None });
            Ok(EmailDeliveryResult {
                success: true,
                message_id: result.id,
                error: None,
            })
        } else {
            let error_text = response.text().await.unwrap_or_default();
            Ok(EmailDeliveryResult {
                success: false,
                message_id: None,
                error: Some(error_text),
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn disabled_config_builds_no_transport() {
        let config = EmailConfig {
            enabled: false,
            ..EmailConfig::default()
        };
        assert!(build_email_transport(&config).unwrap().is_none());
    }

    #[test]
    fn smtp_without_settings_is_a_config_error() {
        let config = EmailConfig::default();
        assert!(matches!(
            build_email_transport(&config),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let config = EmailConfig {
            provider: "pigeon".to_string(),
            ..EmailConfig::default()
        };
        assert!(matches!(
            build_email_transport(&config),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn sendgrid_builds_from_settings() {
        let config = EmailConfig {
            provider: "sendgrid".to_string(),
            sendgrid: Some(SendGridSettings {
                api_key: "sg-key".to_string(),
            }),
            ..EmailConfig::default()
        };
        assert!(build_email_transport(&config).unwrap().is_some());
    }

    #[test]
    fn mailbox_parsing_rejects_garbage() {
        assert!(parse_mailbox("TradeHub", "not an address").is_err());
        assert!(parse_mailbox("TradeHub", "ops@example.com").is_ok());
    }
}
