//! Delivery coordination.
//!
//! One delivery pass attempts every enabled, not-yet-successful channel
//! concurrently, folds the outcomes into the record's channel states and
//! settles the record with a single update: delivered on any success,
//! otherwise failed with a backoff-scheduled retry until the attempt cap.

use chrono::Utc;
use sea_orm::ActiveEnum;
use std::time::Duration;
use tokio::time::timeout;

use tradehub_common::config::Config;
use tradehub_common::{AppError, AppResult, RetryPolicy};
use tradehub_db::entities::notification::{
    self, ChannelState, ChannelStates, NotificationStatus,
};
use tradehub_db::repositories::NotificationRepository;

use super::directory::{Contact, DirectoryService};
use super::email::{EmailMessage, EmailService};
use super::push::{PushPayload, PushService};
use super::sms::SmsService;
use super::templates;

/// The optional channel transports a coordinator sends through. A `None`
/// transport means the channel is disabled in configuration; records that
/// still enable it get a per-channel failure, not a crash.
#[derive(Clone, Default)]
pub struct DeliveryTransports {
    /// Email transport.
    pub email: Option<EmailService>,
    /// SMS transport.
    pub sms: Option<SmsService>,
    /// Push transport.
    pub push: Option<PushService>,
}

/// Outcome of one channel attempt within a delivery pass.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ChannelOutcome {
    /// Channel disabled or already successful; nothing attempted.
    Skipped,
    /// The transport accepted the message.
    Sent,
    /// The attempt failed with this reason.
    Failed(String),
}

/// Runs delivery passes and settles notification records.
#[derive(Clone)]
pub struct DeliveryCoordinator {
    repo: NotificationRepository,
    directory: DirectoryService,
    transports: DeliveryTransports,
    retry_policy: RetryPolicy,
    email_timeout: Duration,
    sms_timeout: Duration,
    push_timeout: Duration,
    site_name: String,
    site_url: String,
}

impl DeliveryCoordinator {
    /// Create a coordinator from configuration.
    #[must_use]
    pub fn new(
        repo: NotificationRepository,
        directory: DirectoryService,
        transports: DeliveryTransports,
        config: &Config,
    ) -> Self {
        Self {
            repo,
            directory,
            transports,
            retry_policy: RetryPolicy::with_max_attempts(config.delivery.max_attempts),
            email_timeout: Duration::from_secs(config.delivery.email_timeout_secs),
            sms_timeout: Duration::from_secs(config.delivery.sms_timeout_secs),
            push_timeout: Duration::from_secs(config.delivery.push_timeout_secs),
            site_name: config.email.site_name.clone(),
            site_url: config.server.url.clone(),
        }
    }

    /// Load a record and run one delivery pass on it.
    pub async fn deliver_by_id(&self, id: &str) -> AppResult<notification::Model> {
        let record = self.repo.get_by_id(id).await?;
        self.deliver(record).await
    }

    /// Run one delivery pass.
    ///
    /// Settled, expired, not-yet-due and retry-exhausted records come back
    /// unchanged;
    /// everything else gets exactly one attempt counted, no matter how many
    /// channels were tried.
    pub async fn deliver(&self, record: notification::Model) -> AppResult<notification::Model> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();

        if record.status.is_settled() {
            tracing::debug!(notification_id = %record.id, status = ?record.status, "Skipping settled notification");
            return Ok(record);
        }
        if record.scheduled_for.is_some_and(|due| due > now) {
            tracing::debug!(notification_id = %record.id, "Skipping notification scheduled for later");
            return Ok(record);
        }
        if record.is_expired(now) {
            tracing::debug!(notification_id = %record.id, "Skipping expired notification");
            if record.processing_until.is_some() {
                self.repo.release_claim(&record.id).await?;
            }
            return Ok(record);
        }
        if record.status == NotificationStatus::Failed && record.retry_exhausted() {
            return Ok(record);
        }

        let contact = self
            .directory
            .get_recipient(&record.recipient_id, record.recipient_type)
            .await?;

        let (email_outcome, sms_outcome, push_outcome) = tokio::join!(
            self.attempt_email(&record, contact.as_ref()),
            self.attempt_sms(&record, contact.as_ref()),
            self.attempt_push(&record),
        );

        let mut channels = record.channels.clone();
        apply_outcome(&mut channels.email, &email_outcome, now);
        apply_outcome(&mut channels.sms, &sms_outcome, now);
        apply_outcome(&mut channels.push, &push_outcome, now);
        // Surfacing the record in the feed is the in-app delivery; there is
        // nothing that can fail.
        if channels.in_app.enabled && !channels.in_app.shown {
            channels.in_app.mark_shown(now);
        }

        let attempts = record.attempts + 1;
        let (status, next_attempt_at) = settle(&channels, attempts, record.max_attempts, || {
            self.retry_policy
                .next_attempt_after(Utc::now(), record.attempts.unsigned_abs())
        });

        tracing::info!(
            notification_id = %record.id,
            status = ?status,
            attempts,
            email = ?email_outcome,
            sms = ?sms_outcome,
            push = ?push_outcome,
            "Delivery pass finished"
        );

        let mut active: notification::ActiveModel = record.into();
        active.channels = sea_orm::Set(channels);
        active.status = sea_orm::Set(status);
        active.attempts = sea_orm::Set(attempts);
        active.last_attempt_at = sea_orm::Set(Some(now));
        active.next_attempt_at = sea_orm::Set(next_attempt_at.map(Into::into));
        active.processing_until = sea_orm::Set(None);
        self.repo.update(active).await
    }

    /// Re-run delivery for a failed record on operator request. Refused when
    /// the record is not failed or its attempt cap is already spent.
    pub async fn retry(&self, id: &str) -> AppResult<notification::Model> {
        let record = self.repo.get_by_id(id).await?;
        if record.status != NotificationStatus::Failed {
            return Err(AppError::Validation(format!(
                "only failed notifications can be retried, not {:?}",
                record.status
            )));
        }
        if record.retry_exhausted() {
            return Err(AppError::Validation(format!(
                "notification {id} has used all {} attempts",
                record.max_attempts
            )));
        }
        self.deliver(record).await
    }

    async fn attempt_email(
        &self,
        record: &notification::Model,
        contact: Option<&Contact>,
    ) -> ChannelOutcome {
        if !record.channels.email.enabled || record.channels.email.sent {
            return ChannelOutcome::Skipped;
        }
        let Some(transport) = &self.transports.email else {
            return ChannelOutcome::Failed("email channel disabled in configuration".to_string());
        };
        let Some(address) = contact.and_then(|c| c.email.clone()) else {
            return ChannelOutcome::Failed("recipient has no email address".to_string());
        };

        let message = EmailMessage {
            to: address,
            subject: record.title.clone(),
            text_body: record.message.clone(),
            html_body: Some(templates::email_html(
                &record.title,
                &record.message,
                &self.site_name,
                &self.site_url,
            )),
        };

        match timeout(self.email_timeout, transport.send_email(message)).await {
            Ok(Ok(result)) if result.success => ChannelOutcome::Sent,
            Ok(Ok(result)) => ChannelOutcome::Failed(
                result.error.unwrap_or_else(|| "provider rejected message".to_string()),
            ),
            Ok(Err(e)) => ChannelOutcome::Failed(e.to_string()),
            Err(_) => ChannelOutcome::Failed("timeout".to_string()),
        }
    }

    async fn attempt_sms(
        &self,
        record: &notification::Model,
        contact: Option<&Contact>,
    ) -> ChannelOutcome {
        if !record.channels.sms.enabled || record.channels.sms.sent {
            return ChannelOutcome::Skipped;
        }
        let Some(transport) = &self.transports.sms else {
            return ChannelOutcome::Failed("SMS channel disabled in configuration".to_string());
        };
        let Some(phone) = contact.and_then(|c| c.phone.clone()) else {
            return ChannelOutcome::Failed("recipient has no phone number".to_string());
        };

        let body = templates::sms_text(&record.title, &record.message);
        match timeout(self.sms_timeout, transport.send_sms(&phone, &body)).await {
            Ok(Ok(())) => ChannelOutcome::Sent,
            Ok(Err(e)) => ChannelOutcome::Failed(e.to_string()),
            Err(_) => ChannelOutcome::Failed("timeout".to_string()),
        }
    }

    async fn attempt_push(&self, record: &notification::Model) -> ChannelOutcome {
        if !record.channels.push.enabled || record.channels.push.sent {
            return ChannelOutcome::Skipped;
        }
        let Some(transport) = &self.transports.push else {
            return ChannelOutcome::Failed("push channel disabled in configuration".to_string());
        };

        let payload = PushPayload {
            notification_type: record.notification_type.to_value(),
            title: record.title.clone(),
            body: record.message.clone(),
            data: record.data.clone(),
        };
        match timeout(
            self.push_timeout,
            transport.send_push(&record.recipient_id, &payload),
        )
        .await
        {
            Ok(Ok(())) => ChannelOutcome::Sent,
            Ok(Err(e)) => ChannelOutcome::Failed(e.to_string()),
            Err(_) => ChannelOutcome::Failed("timeout".to_string()),
        }
    }
}

fn apply_outcome(
    state: &mut ChannelState,
    outcome: &ChannelOutcome,
    now: sea_orm::prelude::DateTimeWithTimeZone,
) {
    match outcome {
        ChannelOutcome::Skipped => {}
        ChannelOutcome::Sent => state.mark_sent(now),
        ChannelOutcome::Failed(reason) => state.mark_failed(reason.clone()),
    }
}

/// Fold channel states into a record status: any success delivers, the
/// attempt cap makes a failure terminal, everything else schedules a retry.
fn settle(
    channels: &ChannelStates,
    attempts: i32,
    max_attempts: i32,
    backoff: impl FnOnce() -> chrono::DateTime<Utc>,
) -> (NotificationStatus, Option<chrono::DateTime<Utc>>) {
    if channels.any_succeeded() {
        (NotificationStatus::Delivered, None)
    } else if attempts >= max_attempts {
        (NotificationStatus::Failed, None)
    } else {
        (NotificationStatus::Failed, Some(backoff()))
    }
}
