//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Email transport configuration.
    #[serde(default)]
    pub email: EmailConfig,
    /// SMS transport configuration.
    #[serde(default)]
    pub sms: SmsConfig,
    /// Push transport configuration.
    #[serde(default)]
    pub push: PushConfig,
    /// Delivery coordinator configuration.
    #[serde(default)]
    pub delivery: DeliveryConfig,
    /// Background scheduler configuration.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of the back-office, used in notification links.
    pub url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            url: "http://localhost:3000".to_string(),
        }
    }
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost:5432/tradehub".to_string(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
        }
    }
}

/// Email transport configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Whether the email channel has a usable transport.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Which provider to send through: `smtp`, `sendgrid` or `mailgun`.
    #[serde(default = "default_email_provider")]
    pub provider: String,
    /// Sender address.
    #[serde(default = "default_from_address")]
    pub from_address: String,
    /// Sender display name.
    #[serde(default = "default_site_name")]
    pub from_name: String,
    /// Optional reply-to address.
    #[serde(default)]
    pub reply_to: Option<String>,
    /// Marketplace name used in rendered templates.
    #[serde(default = "default_site_name")]
    pub site_name: String,
    /// SMTP settings, required when `provider = "smtp"`.
    #[serde(default)]
    pub smtp: Option<SmtpSettings>,
    /// `SendGrid` settings, required when `provider = "sendgrid"`.
    #[serde(default)]
    pub sendgrid: Option<SendGridSettings>,
    /// Mailgun settings, required when `provider = "mailgun"`.
    #[serde(default)]
    pub mailgun: Option<MailgunSettings>,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            provider: default_email_provider(),
            from_address: default_from_address(),
            from_name: default_site_name(),
            reply_to: None,
            site_name: default_site_name(),
            smtp: None,
            sendgrid: None,
            mailgun: None,
        }
    }
}

/// SMTP relay settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpSettings {
    /// SMTP host.
    pub host: String,
    /// SMTP port.
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    /// SMTP username.
    #[serde(default)]
    pub username: Option<String>,
    /// SMTP password.
    #[serde(default)]
    pub password: Option<String>,
}

/// `SendGrid` API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SendGridSettings {
    /// API key.
    pub api_key: String,
}

/// Mailgun API settings.
#[derive(Debug, Clone, Deserialize)]
pub struct MailgunSettings {
    /// API key.
    pub api_key: String,
    /// Sending domain.
    pub domain: String,
}

/// SMS transport configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SmsConfig {
    /// Whether the SMS channel has a usable transport.
    #[serde(default)]
    pub enabled: bool,
    /// HTTP gateway endpoint.
    #[serde(default)]
    pub gateway_url: Option<String>,
    /// Gateway API key.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Alphanumeric sender ID shown on handsets.
    #[serde(default = "default_site_name")]
    pub sender_id: String,
}

impl Default for SmsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            gateway_url: None,
            api_key: None,
            sender_id: default_site_name(),
        }
    }
}

/// Push transport configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PushConfig {
    /// Whether the push channel has a usable transport.
    #[serde(default)]
    pub enabled: bool,
    /// HTTP gateway endpoint.
    #[serde(default)]
    pub gateway_url: Option<String>,
    /// Gateway API key.
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Delivery coordinator configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryConfig {
    /// Delivery attempts allowed per notification before it is terminal.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: i32,
    /// Timeout for one email transport call, in seconds.
    #[serde(default = "default_email_timeout")]
    pub email_timeout_secs: u64,
    /// Timeout for one SMS transport call, in seconds.
    #[serde(default = "default_sms_timeout")]
    pub sms_timeout_secs: u64,
    /// Timeout for one push transport call, in seconds.
    #[serde(default = "default_push_timeout")]
    pub push_timeout_secs: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            email_timeout_secs: default_email_timeout(),
            sms_timeout_secs: default_sms_timeout(),
            push_timeout_secs: default_push_timeout(),
        }
    }
}

/// Background scheduler configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerConfig {
    /// Seconds between retry sweeps.
    #[serde(default = "default_retry_interval")]
    pub retry_interval_secs: u64,
    /// Maximum records picked up per retry sweep.
    #[serde(default = "default_retry_batch_size")]
    pub retry_batch_size: u64,
    /// Seconds between scheduled-send sweeps.
    #[serde(default = "default_scheduled_interval")]
    pub scheduled_interval_secs: u64,
    /// Seconds between cleanup sweeps.
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval_secs: u64,
    /// Seconds a sweep's claim on a record remains valid.
    #[serde(default = "default_claim_lease")]
    pub claim_lease_secs: i64,
    /// Days a read notification is kept before cleanup.
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            retry_interval_secs: default_retry_interval(),
            retry_batch_size: default_retry_batch_size(),
            scheduled_interval_secs: default_scheduled_interval(),
            cleanup_interval_secs: default_cleanup_interval(),
            claim_lease_secs: default_claim_lease(),
            retention_days: default_retention_days(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    100
}

const fn default_min_connections() -> u32 {
    5
}

const fn default_true() -> bool {
    true
}

fn default_email_provider() -> String {
    "smtp".to_string()
}

fn default_from_address() -> String {
    "noreply@tradehub.example".to_string()
}

fn default_site_name() -> String {
    "TradeHub".to_string()
}

const fn default_smtp_port() -> u16 {
    587
}

const fn default_max_attempts() -> i32 {
    3
}

const fn default_email_timeout() -> u64 {
    10
}

const fn default_sms_timeout() -> u64 {
    10
}

const fn default_push_timeout() -> u64 {
    5
}

const fn default_retry_interval() -> u64 {
    60
}

const fn default_retry_batch_size() -> u64 {
    100
}

const fn default_scheduled_interval() -> u64 {
    30
}

const fn default_cleanup_interval() -> u64 {
    3600
}

const fn default_claim_lease() -> i64 {
    300
}

const fn default_retention_days() -> i64 {
    30
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `TRADEHUB_ENV`)
    /// 3. Environment variables with `TRADEHUB_` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("TRADEHUB_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("TRADEHUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("TRADEHUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delivery_defaults() {
        let delivery = DeliveryConfig::default();
        assert_eq!(delivery.max_attempts, 3);
        assert_eq!(delivery.email_timeout_secs, 10);
        assert_eq!(delivery.push_timeout_secs, 5);
    }

    #[test]
    fn scheduler_defaults() {
        let scheduler = SchedulerConfig::default();
        assert_eq!(scheduler.retry_interval_secs, 60);
        assert_eq!(scheduler.retry_batch_size, 100);
        assert_eq!(scheduler.claim_lease_secs, 300);
        assert_eq!(scheduler.retention_days, 30);
    }
}
