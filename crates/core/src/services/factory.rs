//! Notification factory.
//!
//! Turns domain events into persisted notification records: validates the
//! event, resolves the audience through the recipient directory, applies
//! per-type channel and priority defaults, renders the content and inserts
//! one pending record per recipient.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use tradehub_common::{AppError, AppResult, IdGenerator};
use tradehub_db::entities::notification::{
    self, ActorKind, ChannelSelection, ChannelStates, NotificationPriority, NotificationStatus,
    NotificationType,
};
use tradehub_db::repositories::NotificationRepository;

use super::directory::{Contact, DirectoryService};
use super::templates;

/// A typed reference to a user, admin or the system itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorRef {
    /// Actor ID.
    pub id: String,
    /// Kind of actor.
    pub kind: ActorKind,
}

/// Who a notification is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "audience")]
pub enum RecipientSpec {
    /// An explicit list of recipients.
    Direct {
        /// The recipients.
        recipients: Vec<ActorRef>,
    },
    /// Every currently active admin. Used by back-office events such as new
    /// registrations and support messages.
    ActiveAdmins,
}

/// A domain event the factory knows how to turn into a notification.
///
/// The full event is preserved verbatim in the record's `data` column, so
/// consumers can read fields the rendered text dropped or truncated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "eventType")]
pub enum NotificationEvent {
    /// A comment was posted or edited on an order.
    #[serde(rename_all = "camelCase")]
    OrderComment {
        /// Order ID.
        order_id: String,
        /// Comment ID.
        comment_id: String,
        /// Human-facing order number.
        order_number: String,
        /// The comment text.
        comment_content: String,
        /// True when an existing comment was edited.
        #[serde(default)]
        is_update: bool,
    },
    /// An order moved to a new status.
    #[serde(rename_all = "camelCase")]
    OrderStatus {
        /// Order ID.
        order_id: String,
        /// Human-facing order number.
        order_number: String,
        /// Previous status label.
        old_status: String,
        /// New status label.
        new_status: String,
    },
    /// A payment state change on an order. Amounts are display strings,
    /// formatted upstream with their currency.
    #[serde(rename_all = "camelCase")]
    OrderPayment {
        /// Order ID.
        order_id: String,
        /// Human-facing order number.
        order_number: String,
        /// Display amount, e.g. "€1,250.00".
        amount: String,
        /// Payment status label.
        payment_status: String,
    },
    /// A delivery state change on an order.
    #[serde(rename_all = "camelCase")]
    OrderDelivery {
        /// Order ID.
        order_id: String,
        /// Human-facing order number.
        order_number: String,
        /// Delivery status label.
        delivery_status: String,
        /// Carrier tracking number, when known.
        #[serde(default)]
        tracking_number: Option<String>,
    },
    /// An operational alert from the platform itself.
    #[serde(rename_all = "camelCase")]
    SystemAlert {
        /// Alert headline.
        subject: String,
        /// Alert body.
        details: String,
    },
    /// A marketing campaign message.
    #[serde(rename_all = "camelCase")]
    Marketing {
        /// Campaign subject.
        subject: String,
        /// Campaign body.
        body: String,
        /// Featured product, when the campaign has one.
        #[serde(default)]
        product_id: Option<String>,
    },
    /// A security-relevant event on an account.
    #[serde(rename_all = "camelCase")]
    Security {
        /// Alert headline.
        subject: String,
        /// Alert body.
        details: String,
    },
    /// A scheduled reminder.
    #[serde(rename_all = "camelCase")]
    Reminder {
        /// Reminder headline.
        subject: String,
        /// Reminder body.
        details: String,
        /// Related order, when the reminder concerns one.
        #[serde(default)]
        order_id: Option<String>,
    },
    /// A new account registered and awaits approval.
    #[serde(rename_all = "camelCase")]
    UserRegistration {
        /// The new user's ID.
        user_id: String,
        /// The new user's name.
        user_name: String,
        /// The company they registered for.
        company_name: String,
    },
    /// A message arrived on a support ticket.
    #[serde(rename_all = "camelCase")]
    SupportMessage {
        /// Ticket ID.
        ticket_id: String,
        /// Author name.
        user_name: String,
        /// The message text.
        message_content: String,
    },
}

impl NotificationEvent {
    /// The notification type this event produces.
    #[must_use]
    pub const fn notification_type(&self) -> NotificationType {
        match self {
            Self::OrderComment { .. } => NotificationType::OrderComment,
            Self::OrderStatus { .. } => NotificationType::OrderStatus,
            Self::OrderPayment { .. } => NotificationType::OrderPayment,
            Self::OrderDelivery { .. } => NotificationType::OrderDelivery,
            Self::SystemAlert { .. } => NotificationType::SystemAlert,
            Self::Marketing { .. } => NotificationType::Marketing,
            Self::Security { .. } => NotificationType::Security,
            Self::Reminder { .. } => NotificationType::Reminder,
            Self::UserRegistration { .. } => NotificationType::UserRegistration,
            Self::SupportMessage { .. } => NotificationType::SupportMessage,
        }
    }

    /// Related order, when the event concerns one.
    #[must_use]
    pub fn order_id(&self) -> Option<&str> {
        match self {
            Self::OrderComment { order_id, .. }
            | Self::OrderStatus { order_id, .. }
            | Self::OrderPayment { order_id, .. }
            | Self::OrderDelivery { order_id, .. } => Some(order_id),
            Self::Reminder { order_id, .. } => order_id.as_deref(),
            _ => None,
        }
    }

    /// Related comment, when the event concerns one.
    #[must_use]
    pub fn comment_id(&self) -> Option<&str> {
        match self {
            Self::OrderComment { comment_id, .. } => Some(comment_id),
            _ => None,
        }
    }

    /// Related product, when the event concerns one.
    #[must_use]
    pub fn product_id(&self) -> Option<&str> {
        match self {
            Self::Marketing { product_id, .. } => product_id.as_deref(),
            _ => None,
        }
    }

    /// Reject events whose required fields are blank.
    pub fn validate(&self) -> AppResult<()> {
        let blank = |field: &str, value: &str| {
            if value.trim().is_empty() {
                Err(AppError::Validation(format!("{field} must not be empty")))
            } else {
                Ok(())
            }
        };

        match self {
            Self::OrderComment {
                order_id,
                comment_id,
                comment_content,
                ..
            } => {
                blank("orderId", order_id)?;
                blank("commentId", comment_id)?;
                blank("commentContent", comment_content)
            }
            Self::OrderStatus {
                order_id,
                new_status,
                ..
            } => {
                blank("orderId", order_id)?;
                blank("newStatus", new_status)
            }
            Self::OrderPayment {
                order_id,
                payment_status,
                ..
            } => {
                blank("orderId", order_id)?;
                blank("paymentStatus", payment_status)
            }
            Self::OrderDelivery {
                order_id,
                delivery_status,
                ..
            } => {
                blank("orderId", order_id)?;
                blank("deliveryStatus", delivery_status)
            }
            Self::SystemAlert { subject, details }
            | Self::Security { subject, details }
            | Self::Reminder {
                subject, details, ..
            } => {
                blank("subject", subject)?;
                blank("details", details)
            }
            Self::Marketing { subject, body, .. } => {
                blank("subject", subject)?;
                blank("body", body)
            }
            Self::UserRegistration {
                user_id, user_name, ..
            } => {
                blank("userId", user_id)?;
                blank("userName", user_name)
            }
            Self::SupportMessage {
                ticket_id,
                message_content,
                ..
            } => {
                blank("ticketId", ticket_id)?;
                blank("messageContent", message_content)
            }
        }
    }
}

/// Per-call overrides for notification creation. All fields default to the
/// per-type tables in [`templates`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOptions {
    /// Who triggered the event, when attributable.
    #[serde(default)]
    pub sender: Option<ActorRef>,
    /// Channel override. Security notifications keep in-app on regardless.
    #[serde(default)]
    pub channels: Option<ChannelSelection>,
    /// Priority override.
    #[serde(default)]
    pub priority: Option<NotificationPriority>,
    /// Defer delivery until this time.
    #[serde(default)]
    pub scheduled_for: Option<DateTime<Utc>>,
    /// Drop the notification entirely after this time.
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    /// Per-record attempt cap override.
    #[serde(default)]
    pub max_attempts: Option<i32>,
}

#[derive(Validate)]
struct RenderedContent {
    #[validate(length(min = 1, max = 200))]
    title: String,
    #[validate(length(min = 1, max = 1000))]
    message: String,
}

/// Creates notification records from domain events.
#[derive(Clone)]
pub struct NotificationFactory {
    repo: NotificationRepository,
    directory: DirectoryService,
    id_gen: IdGenerator,
    default_max_attempts: i32,
}

impl NotificationFactory {
    /// Create a factory.
    #[must_use]
    pub fn new(
        repo: NotificationRepository,
        directory: DirectoryService,
        default_max_attempts: i32,
    ) -> Self {
        Self {
            repo,
            directory,
            id_gen: IdGenerator::new(),
            default_max_attempts,
        }
    }

    /// Create one pending notification per resolvable recipient.
    ///
    /// Unresolvable entries in a direct list are dropped; an audience that
    /// resolves to nobody is an error, since a notification without a
    /// recipient cannot exist.
    pub async fn create(
        &self,
        event: &NotificationEvent,
        recipients: &RecipientSpec,
        options: &CreateOptions,
    ) -> AppResult<Vec<notification::Model>> {
        event.validate()?;

        let contacts = self.resolve(recipients).await?;
        if contacts.is_empty() {
            return Err(AppError::RecipientResolution(
                "no resolvable recipients for notification".to_string(),
            ));
        }

        let notification_type = event.notification_type();
        let priority = options
            .priority
            .unwrap_or_else(|| templates::default_priority(notification_type));

        let mut selection = options
            .channels
            .unwrap_or_else(|| templates::default_channels(notification_type));
        if notification_type == NotificationType::Security {
            // Security notifications always leave an in-app trace.
            selection.in_app = true;
        }
        if selection.is_empty() {
            return Err(AppError::Validation(
                "notification must enable at least one channel".to_string(),
            ));
        }

        let (title, message) = templates::render(event);
        RenderedContent {
            title: title.clone(),
            message: message.clone(),
        }
        .validate()?;

        let data = serde_json::to_value(event)
            .map_err(|e| AppError::Internal(format!("failed to serialize event: {e}")))?;
        let max_attempts = options.max_attempts.unwrap_or(self.default_max_attempts);
        if max_attempts < 1 {
            return Err(AppError::Validation(
                "maxAttempts must be at least 1".to_string(),
            ));
        }

        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let mut created = Vec::with_capacity(contacts.len());
        for contact in contacts {
            let active = notification::ActiveModel {
                id: sea_orm::Set(self.id_gen.generate()),
                recipient_id: sea_orm::Set(contact.id.clone()),
                recipient_type: sea_orm::Set(contact.kind),
                sender_id: sea_orm::Set(options.sender.as_ref().map(|s| s.id.clone())),
                sender_type: sea_orm::Set(options.sender.as_ref().map(|s| s.kind)),
                notification_type: sea_orm::Set(notification_type),
                priority: sea_orm::Set(priority),
                title: sea_orm::Set(title.clone()),
                message: sea_orm::Set(message.clone()),
                order_id: sea_orm::Set(event.order_id().map(String::from)),
                comment_id: sea_orm::Set(event.comment_id().map(String::from)),
                product_id: sea_orm::Set(event.product_id().map(String::from)),
                data: sea_orm::Set(Some(data.clone())),
                channels: sea_orm::Set(ChannelStates::from_selection(selection)),
                status: sea_orm::Set(NotificationStatus::Pending),
                is_read: sea_orm::Set(false),
                read_at: sea_orm::Set(None),
                attempts: sea_orm::Set(0),
                max_attempts: sea_orm::Set(max_attempts),
                last_attempt_at: sea_orm::Set(None),
                next_attempt_at: sea_orm::Set(None),
                scheduled_for: sea_orm::Set(options.scheduled_for.map(Into::into)),
                expires_at: sea_orm::Set(options.expires_at.map(Into::into)),
                processing_until: sea_orm::Set(None),
                created_at: sea_orm::Set(now),
            };

            let record = self.repo.create(active).await?;
            tracing::debug!(
                notification_id = %record.id,
                recipient_id = %record.recipient_id,
                notification_type = ?notification_type,
                "Created notification"
            );
            created.push(record);
        }

        Ok(created)
    }

    /// Withdraw a notification. Only pending and failed records can be
    /// cancelled; settled records keep their outcome.
    pub async fn cancel(&self, id: &str) -> AppResult<notification::Model> {
        let record = self.repo.get_by_id(id).await?;
        match record.status {
            NotificationStatus::Pending | NotificationStatus::Failed => {}
            status => {
                return Err(AppError::Validation(format!(
                    "cannot cancel a notification in status {status:?}"
                )));
            }
        }

        let mut active: notification::ActiveModel = record.into();
        active.status = sea_orm::Set(NotificationStatus::Cancelled);
        active.next_attempt_at = sea_orm::Set(None);
        active.processing_until = sea_orm::Set(None);
        let cancelled = self.repo.update(active).await?;
        tracing::info!(notification_id = %cancelled.id, "Cancelled notification");
        Ok(cancelled)
    }

    async fn resolve(&self, recipients: &RecipientSpec) -> AppResult<Vec<Contact>> {
        match recipients {
            RecipientSpec::Direct { recipients } => {
                let mut contacts = Vec::with_capacity(recipients.len());
                for actor in recipients {
                    match self.directory.get_recipient(&actor.id, actor.kind).await? {
                        Some(contact) => contacts.push(contact),
                        None => {
                            tracing::warn!(
                                recipient_id = %actor.id,
                                recipient_kind = ?actor.kind,
                                "Skipping unresolvable recipient"
                            );
                        }
                    }
                }
                Ok(contacts)
            }
            RecipientSpec::ActiveAdmins => self.directory.active_admins().await,
        }
    }
}
