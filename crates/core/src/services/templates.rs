//! Per-type content templates and channel defaults.
//!
//! All title/message rendering, truncation and type-default tables live here
//! so the factory and the delivery coordinator share one source of wording.

use tradehub_db::entities::notification::{
    ChannelSelection, NotificationPriority, NotificationType,
};

use super::factory::NotificationEvent;

/// Longest free-text snippet embedded in a message body. The full text is
/// preserved in the record's `data` payload.
pub const SNIPPET_LEN: usize = 100;

/// Hard cap on a rendered title.
pub const TITLE_LEN: usize = 200;

/// Hard cap on a rendered message.
pub const MESSAGE_LEN: usize = 1000;

/// Longest SMS body.
pub const SMS_LEN: usize = 160;

/// Truncate `text` to at most `max_chars` characters, appending an ellipsis
/// marker when anything was cut. Counts characters, not bytes, so multi-byte
/// input never splits a code point.
#[must_use]
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", cut.trim_end())
}

/// Render the title and message for an event.
#[must_use]
pub fn render(event: &NotificationEvent) -> (String, String) {
    let (title, message) = match event {
        NotificationEvent::OrderComment {
            order_number,
            comment_content,
            is_update,
            ..
        } => {
            let verb = if *is_update { "updated a comment" } else { "commented" };
            (
                format!("New comment on order #{order_number}"),
                format!(
                    "Someone {verb} on order #{order_number}: \"{}\"",
                    truncate_text(comment_content, SNIPPET_LEN)
                ),
            )
        }
        NotificationEvent::OrderStatus {
            order_number,
            old_status,
            new_status,
            ..
        } => (
            format!("Order #{order_number} status changed"),
            format!("Order #{order_number} moved from {old_status} to {new_status}."),
        ),
        NotificationEvent::OrderPayment {
            order_number,
            amount,
            payment_status,
            ..
        } => (
            format!("Payment update for order #{order_number}"),
            format!("Payment of {amount} for order #{order_number} is now {payment_status}."),
        ),
        NotificationEvent::OrderDelivery {
            order_number,
            delivery_status,
            tracking_number,
            ..
        } => {
            let tracking = tracking_number
                .as_deref()
                .map(|t| format!(" Tracking number: {t}."))
                .unwrap_or_default();
            (
                format!("Delivery update for order #{order_number}"),
                format!("Order #{order_number} delivery is now {delivery_status}.{tracking}"),
            )
        }
        NotificationEvent::SystemAlert { subject, details } => (
            format!("System alert: {subject}"),
            truncate_text(details, MESSAGE_LEN),
        ),
        NotificationEvent::Marketing { subject, body, .. } => {
            (subject.clone(), truncate_text(body, MESSAGE_LEN))
        }
        NotificationEvent::Security { subject, details } => (
            format!("Security alert: {subject}"),
            truncate_text(details, MESSAGE_LEN),
        ),
        NotificationEvent::Reminder { subject, details, .. } => (
            format!("Reminder: {subject}"),
            truncate_text(details, MESSAGE_LEN),
        ),
        NotificationEvent::UserRegistration {
            user_name,
            company_name,
            ..
        } => (
            "New registration pending approval".to_string(),
            format!("{user_name} of {company_name} registered and is awaiting approval."),
        ),
        NotificationEvent::SupportMessage {
            ticket_id,
            user_name,
            message_content,
        } => (
            format!("Support message on ticket {ticket_id}"),
            format!(
                "{user_name} wrote: \"{}\"",
                truncate_text(message_content, SNIPPET_LEN)
            ),
        ),
    };

    (truncate_text(&title, TITLE_LEN), truncate_text(&message, MESSAGE_LEN))
}

/// Default channel enablement per notification type.
#[must_use]
pub const fn default_channels(notification_type: NotificationType) -> ChannelSelection {
    match notification_type {
        NotificationType::OrderComment | NotificationType::SupportMessage => ChannelSelection {
            email: true,
            sms: false,
            push: true,
            in_app: true,
        },
        NotificationType::OrderStatus | NotificationType::OrderDelivery => ChannelSelection {
            email: true,
            sms: true,
            push: true,
            in_app: true,
        },
        NotificationType::OrderPayment | NotificationType::Security => ChannelSelection {
            email: true,
            sms: true,
            push: true,
            in_app: true,
        },
        NotificationType::SystemAlert | NotificationType::UserRegistration => ChannelSelection {
            email: true,
            sms: false,
            push: false,
            in_app: true,
        },
        NotificationType::Marketing => ChannelSelection {
            email: true,
            sms: false,
            push: false,
            in_app: false,
        },
        NotificationType::Reminder => ChannelSelection {
            email: false,
            sms: false,
            push: true,
            in_app: true,
        },
    }
}

/// Default priority per notification type.
#[must_use]
pub const fn default_priority(notification_type: NotificationType) -> NotificationPriority {
    match notification_type {
        NotificationType::Security => NotificationPriority::Urgent,
        NotificationType::OrderPayment | NotificationType::SystemAlert => {
            NotificationPriority::High
        }
        NotificationType::Marketing => NotificationPriority::Low,
        NotificationType::OrderComment
        | NotificationType::OrderStatus
        | NotificationType::OrderDelivery
        | NotificationType::Reminder
        | NotificationType::UserRegistration
        | NotificationType::SupportMessage => NotificationPriority::Normal,
    }
}

/// Plain-text SMS rendering: title plus as much of the message as fits.
#[must_use]
pub fn sms_text(title: &str, message: &str) -> String {
    truncate_text(&format!("{title}: {message}"), SMS_LEN)
}

/// Wrap message content in the shared HTML email frame.
#[must_use]
pub fn email_html(title: &str, message: &str, site_name: &str, site_url: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <style>
        body {{ font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; }}
        a {{ color: #007bff; }}
        h2 {{ margin-bottom: 8px; }}
    </style>
</head>
<body>
    <h2>{title}</h2>
    <p>{message}</p>
    <hr style="margin-top: 40px; border: none; border-top: 1px solid #e9ecef;">
    <p style="font-size: 12px; color: #6c757d;">
        This notification was sent from <a href="{site_url}">{site_name}</a>.<br>
        You can manage your notification preferences in the back office.
    </p>
</body>
</html>"#
    )
}
