//! Notification entity.
//!
//! One row is one notification instance for one recipient. Per-channel
//! delivery state lives in the `channels` JSONB column; everything the retry
//! sweep or the unread queries filter on is a real column.

use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Notification types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    #[sea_orm(string_value = "order_comment")]
    OrderComment,
    #[sea_orm(string_value = "order_status")]
    OrderStatus,
    #[sea_orm(string_value = "order_payment")]
    OrderPayment,
    #[sea_orm(string_value = "order_delivery")]
    OrderDelivery,
    #[sea_orm(string_value = "system_alert")]
    SystemAlert,
    #[sea_orm(string_value = "marketing")]
    Marketing,
    #[sea_orm(string_value = "security")]
    Security,
    #[sea_orm(string_value = "reminder")]
    Reminder,
    #[sea_orm(string_value = "user_registration")]
    UserRegistration,
    #[sea_orm(string_value = "support_message")]
    SupportMessage,
}

/// Notification priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "normal")]
    Normal,
    #[sea_orm(string_value = "high")]
    High,
    #[sea_orm(string_value = "urgent")]
    Urgent,
}

/// Notification lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    /// Created, no delivery outcome yet.
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Handed to a transport; kept for consumers that distinguish it from
    /// `delivered`. The pipeline itself moves pending straight to a settled
    /// status once all channels resolve.
    #[sea_orm(string_value = "sent")]
    Sent,
    /// At least one enabled channel succeeded.
    #[sea_orm(string_value = "delivered")]
    Delivered,
    /// Last attempt had no successful channel.
    #[sea_orm(string_value = "failed")]
    Failed,
    /// Withdrawn by an operator.
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl NotificationStatus {
    /// Statuses the automatic pipeline never touches again.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }
}

/// Kind of actor a notification targets or originates from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "admin")]
    Admin,
    #[sea_orm(string_value = "system")]
    System,
}

/// State of one outbound channel (email, SMS, push).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelState {
    /// Whether this channel participates in delivery.
    pub enabled: bool,
    /// Whether the transport accepted the message.
    #[serde(default)]
    pub sent: bool,
    /// When the transport accepted the message.
    #[serde(default)]
    pub sent_at: Option<DateTimeWithTimeZone>,
    /// Last failure reason, cleared on success.
    #[serde(default)]
    pub error: Option<String>,
}

impl ChannelState {
    /// A channel that takes part in delivery but has not been attempted.
    #[must_use]
    pub const fn enabled() -> Self {
        Self {
            enabled: true,
            sent: false,
            sent_at: None,
            error: None,
        }
    }

    /// A channel excluded from delivery.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            sent: false,
            sent_at: None,
            error: None,
        }
    }

    /// Record a successful transport call.
    pub fn mark_sent(&mut self, at: DateTimeWithTimeZone) {
        self.sent = true;
        self.sent_at = Some(at);
        self.error = None;
    }

    /// Record a failed transport call.
    pub fn mark_failed(&mut self, error: impl Into<String>) {
        self.sent = false;
        self.error = Some(error.into());
    }
}

/// State of the in-app channel. There is no external transport; showing the
/// notification in the back-office feed is the delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InAppState {
    /// Whether this channel participates in delivery.
    pub enabled: bool,
    /// Whether the notification was surfaced in the feed.
    #[serde(default)]
    pub shown: bool,
    /// When the notification was surfaced.
    #[serde(default)]
    pub shown_at: Option<DateTimeWithTimeZone>,
    /// Kept for shape parity with the transport channels; never set.
    #[serde(default)]
    pub error: Option<String>,
}

impl InAppState {
    /// An in-app channel that has not been surfaced yet.
    #[must_use]
    pub const fn enabled() -> Self {
        Self {
            enabled: true,
            shown: false,
            shown_at: None,
            error: None,
        }
    }

    /// An in-app channel excluded from delivery.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            enabled: false,
            shown: false,
            shown_at: None,
            error: None,
        }
    }

    /// Surface the notification in the feed.
    pub fn mark_shown(&mut self, at: DateTimeWithTimeZone) {
        self.shown = true;
        self.shown_at = Some(at);
    }
}

/// Which channels a notification should go out on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSelection {
    /// Email channel toggle.
    pub email: bool,
    /// SMS channel toggle.
    pub sms: bool,
    /// Push channel toggle.
    pub push: bool,
    /// In-app channel toggle.
    pub in_app: bool,
}

impl ChannelSelection {
    /// True when no channel is enabled.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !(self.email || self.sms || self.push || self.in_app)
    }
}

/// Per-channel delivery state, stored as one JSONB value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStates {
    /// Email channel.
    pub email: ChannelState,
    /// SMS channel.
    pub sms: ChannelState,
    /// Push channel.
    pub push: ChannelState,
    /// In-app channel.
    pub in_app: InAppState,
}

impl ChannelStates {
    /// Build the initial channel states from a selection.
    #[must_use]
    pub const fn from_selection(selection: ChannelSelection) -> Self {
        Self {
            email: if selection.email {
                ChannelState::enabled()
            } else {
                ChannelState::disabled()
            },
            sms: if selection.sms {
                ChannelState::enabled()
            } else {
                ChannelState::disabled()
            },
            push: if selection.push {
                ChannelState::enabled()
            } else {
                ChannelState::disabled()
            },
            in_app: if selection.in_app {
                InAppState::enabled()
            } else {
                InAppState::disabled()
            },
        }
    }

    /// Whether any channel participates in delivery.
    #[must_use]
    pub const fn any_enabled(&self) -> bool {
        self.email.enabled || self.sms.enabled || self.push.enabled || self.in_app.enabled
    }

    /// Whether any enabled channel has succeeded.
    #[must_use]
    pub const fn any_succeeded(&self) -> bool {
        self.email.sent || self.sms.sent || self.push.sent || self.in_app.shown
    }
}

/// A persisted notification record.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notification")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Who receives the notification.
    #[sea_orm(indexed)]
    pub recipient_id: String,

    /// Kind of the recipient.
    pub recipient_type: ActorKind,

    /// Who triggered the notification, when attributable.
    #[sea_orm(nullable)]
    pub sender_id: Option<String>,

    /// Kind of the sender.
    #[sea_orm(nullable)]
    pub sender_type: Option<ActorKind>,

    /// Notification type.
    pub notification_type: NotificationType,

    /// Priority.
    pub priority: NotificationPriority,

    /// Short headline.
    pub title: String,

    /// Body text. Long source text is truncated at render time; the full
    /// text is preserved in `data`.
    pub message: String,

    /// Related order (weak reference, no ownership).
    #[sea_orm(nullable)]
    pub order_id: Option<String>,

    /// Related comment (weak reference).
    #[sea_orm(nullable)]
    pub comment_id: Option<String>,

    /// Related product (weak reference).
    #[sea_orm(nullable)]
    pub product_id: Option<String>,

    /// Full event payload.
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub data: Option<Json>,

    /// Per-channel delivery state.
    #[sea_orm(column_type = "JsonBinary")]
    pub channels: ChannelStates,

    /// Lifecycle status.
    pub status: NotificationStatus,

    /// Has the recipient read this notification? True iff `read_at` is set.
    #[sea_orm(default_value = false)]
    pub is_read: bool,

    /// When the recipient read it.
    #[sea_orm(nullable)]
    pub read_at: Option<DateTimeWithTimeZone>,

    /// Completed delivery attempts.
    #[sea_orm(default_value = 0)]
    pub attempts: i32,

    /// Attempts allowed before the record is terminal.
    #[sea_orm(default_value = 3)]
    pub max_attempts: i32,

    /// When the last attempt ran.
    #[sea_orm(nullable)]
    pub last_attempt_at: Option<DateTimeWithTimeZone>,

    /// When the next attempt is due. Only set while failed and retriable.
    #[sea_orm(nullable)]
    pub next_attempt_at: Option<DateTimeWithTimeZone>,

    /// Deferred-send time. The record stays pending until this passes.
    #[sea_orm(nullable)]
    pub scheduled_for: Option<DateTimeWithTimeZone>,

    /// Expiry time. Past it the record is invisible to active queries and
    /// eligible for cleanup.
    #[sea_orm(nullable)]
    pub expires_at: Option<DateTimeWithTimeZone>,

    /// Sweep claim lease. A sweep owns the record until this passes.
    #[sea_orm(nullable)]
    pub processing_until: Option<DateTimeWithTimeZone>,

    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Whether the record is past its expiry time.
    #[must_use]
    pub fn is_expired(&self, now: DateTimeWithTimeZone) -> bool {
        self.expires_at.is_some_and(|expires| expires <= now)
    }

    /// Whether automatic retry is exhausted.
    #[must_use]
    pub const fn retry_exhausted(&self) -> bool {
        self.attempts >= self.max_attempts
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
