//! Notification endpoints.

use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};
use validator::Validate;

use tradehub_common::AppResult;
use tradehub_core::services::{CreateOptions, NotificationEvent, RecipientSpec};
use tradehub_db::entities::notification::{
    ActorKind, ChannelStates, Model as NotificationModel, NotificationPriority, NotificationStatus,
    NotificationType,
};
use tradehub_db::repositories::{ListParams, SortBy, SortOrder};

use crate::{response::ApiResponse, state::AppState};

/// One notification as the API renders it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: String,
    pub recipient_id: String,
    pub recipient_type: ActorKind,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    pub priority: NotificationPriority,
    pub title: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    pub channels: ChannelStates,
    pub status: NotificationStatus,
    pub is_read: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_at: Option<String>,
    pub attempts: i32,
    pub max_attempts: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_attempt_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheduled_for: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
    pub created_at: String,
}

impl From<NotificationModel> for NotificationResponse {
    fn from(n: NotificationModel) -> Self {
        Self {
            id: n.id,
            recipient_id: n.recipient_id,
            recipient_type: n.recipient_type,
            notification_type: n.notification_type,
            priority: n.priority,
            title: n.title,
            message: n.message,
            order_id: n.order_id,
            comment_id: n.comment_id,
            product_id: n.product_id,
            data: n.data,
            channels: n.channels,
            status: n.status,
            is_read: n.is_read,
            read_at: n.read_at.map(|t| t.to_rfc3339()),
            attempts: n.attempts,
            max_attempts: n.max_attempts,
            next_attempt_at: n.next_attempt_at.map(|t| t.to_rfc3339()),
            scheduled_for: n.scheduled_for.map(|t| t.to_rfc3339()),
            expires_at: n.expires_at.map(|t| t.to_rfc3339()),
            created_at: n.created_at.to_rfc3339(),
        }
    }
}

/// List notifications request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsRequest {
    #[validate(length(min = 1))]
    pub recipient_id: String,
    /// 1-based page number (default: 1).
    #[serde(default = "default_page")]
    pub page: u64,
    /// Page size (default: 30, max: 100).
    #[serde(default = "default_limit")]
    pub limit: u64,
    /// Only this notification type.
    #[serde(rename = "type")]
    pub notification_type: Option<NotificationType>,
    /// Only this priority.
    pub priority: Option<NotificationPriority>,
    /// Only read or only unread records.
    pub is_read: Option<bool>,
    #[serde(default)]
    pub sort_by: SortBy,
    #[serde(default)]
    pub sort_order: SortOrder,
    /// Include the unread count in the response.
    #[serde(default)]
    pub with_unread_count: bool,
}

const fn default_page() -> u64 {
    1
}

const fn default_limit() -> u64 {
    30
}

/// Paginated listing response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsListResponse {
    pub notifications: Vec<NotificationResponse>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unread_count: Option<u64>,
}

/// List a recipient's notifications.
async fn list_notifications(
    State(state): State<AppState>,
    Json(req): Json<ListNotificationsRequest>,
) -> AppResult<ApiResponse<NotificationsListResponse>> {
    req.validate()?;

    let limit = req.limit.min(ListParams::MAX_LIMIT);
    let params = ListParams {
        page: req.page,
        limit,
        notification_type: req.notification_type,
        priority: req.priority,
        is_read: req.is_read,
        sort_by: req.sort_by,
        sort_order: req.sort_order,
    };
    let (records, total) = state.query.list(&req.recipient_id, &params).await?;

    let unread_count = if req.with_unread_count {
        Some(state.query.unread_count(&req.recipient_id, None).await?)
    } else {
        None
    };

    Ok(ApiResponse::ok(NotificationsListResponse {
        notifications: records.into_iter().map(Into::into).collect(),
        total,
        page: req.page,
        limit,
        unread_count,
    }))
}

/// Create notifications request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationsRequest {
    /// The domain event.
    pub event: NotificationEvent,
    /// Who receives it.
    pub recipients: RecipientSpec,
    /// Per-call overrides.
    #[serde(default)]
    pub options: CreateOptions,
    /// Run a delivery pass right away (default: true). Records with a
    /// scheduled send time wait for the scheduler either way.
    #[serde(default = "default_true")]
    pub deliver: bool,
}

const fn default_true() -> bool {
    true
}

/// Create notifications for an event and optionally deliver them.
async fn create_notifications(
    State(state): State<AppState>,
    Json(req): Json<CreateNotificationsRequest>,
) -> AppResult<ApiResponse<Vec<NotificationResponse>>> {
    let created = state
        .factory
        .create(&req.event, &req.recipients, &req.options)
        .await?;

    let immediate = req.deliver && req.options.scheduled_for.is_none();
    let mut results = Vec::with_capacity(created.len());
    for record in created {
        if immediate {
            results.push(state.coordinator.deliver(record).await?);
        } else {
            results.push(record);
        }
    }

    Ok(ApiResponse::ok(results.into_iter().map(Into::into).collect()))
}

/// Single-notification request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NotificationIdRequest {
    #[validate(length(min = 1))]
    pub notification_id: String,
}

/// Run a delivery pass on one notification.
async fn deliver_notification(
    State(state): State<AppState>,
    Json(req): Json<NotificationIdRequest>,
) -> AppResult<ApiResponse<NotificationResponse>> {
    req.validate()?;
    let record = state.coordinator.deliver_by_id(&req.notification_id).await?;
    Ok(ApiResponse::ok(record.into()))
}

/// Retry a failed notification.
async fn retry_notification(
    State(state): State<AppState>,
    Json(req): Json<NotificationIdRequest>,
) -> AppResult<ApiResponse<NotificationResponse>> {
    req.validate()?;
    let record = state.coordinator.retry(&req.notification_id).await?;
    Ok(ApiResponse::ok(record.into()))
}

/// Withdraw a notification.
async fn cancel_notification(
    State(state): State<AppState>,
    Json(req): Json<NotificationIdRequest>,
) -> AppResult<ApiResponse<NotificationResponse>> {
    req.validate()?;
    let record = state.factory.cancel(&req.notification_id).await?;
    Ok(ApiResponse::ok(record.into()))
}

/// Unread count request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountRequest {
    #[validate(length(min = 1))]
    pub recipient_id: String,
    pub recipient_type: Option<ActorKind>,
}

/// Unread count response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnreadCountResponse {
    pub count: u64,
}

/// Unread badge count for a recipient.
async fn unread_count(
    State(state): State<AppState>,
    Json(req): Json<UnreadCountRequest>,
) -> AppResult<ApiResponse<UnreadCountResponse>> {
    req.validate()?;
    let count = state
        .query
        .unread_count(&req.recipient_id, req.recipient_type)
        .await?;
    Ok(ApiResponse::ok(UnreadCountResponse { count }))
}

/// Mark as read request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MarkAsReadRequest {
    #[validate(length(min = 1))]
    pub notification_id: String,
    #[validate(length(min = 1))]
    pub recipient_id: String,
}

/// Mark one notification as read.
async fn mark_as_read(
    State(state): State<AppState>,
    Json(req): Json<MarkAsReadRequest>,
) -> AppResult<ApiResponse<NotificationResponse>> {
    req.validate()?;
    let record = state
        .query
        .mark_as_read(&req.notification_id, &req.recipient_id)
        .await?;
    Ok(ApiResponse::ok(record.into()))
}

/// Mark all as read request.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MarkAllAsReadRequest {
    #[validate(length(min = 1))]
    pub recipient_id: String,
}

/// Mark all as read response.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAllAsReadResponse {
    pub count: u64,
}

/// Mark every unread notification of a recipient as read.
async fn mark_all_as_read(
    State(state): State<AppState>,
    Json(req): Json<MarkAllAsReadRequest>,
) -> AppResult<ApiResponse<MarkAllAsReadResponse>> {
    req.validate()?;
    let count = state.query.mark_all_as_read(&req.recipient_id).await?;
    Ok(ApiResponse::ok(MarkAllAsReadResponse { count }))
}

/// Notification route set.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(list_notifications))
        .route("/create", post(create_notifications))
        .route("/deliver", post(deliver_notification))
        .route("/retry", post(retry_notification))
        .route("/cancel", post(cancel_notification))
        .route("/unread-count", post(unread_count))
        .route("/mark-as-read", post(mark_as_read))
        .route("/mark-all-as-read", post(mark_all_as_read))
}
