//! Notification repository.

use std::sync::Arc;

use crate::entities::{Notification, notification};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use tradehub_common::{AppError, AppResult};

use crate::entities::notification::{NotificationPriority, NotificationStatus, NotificationType};

/// Sort key for notification listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortBy {
    /// Creation time (the default).
    #[default]
    CreatedAt,
    /// Priority.
    Priority,
}

/// Sort direction for notification listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortOrder {
    /// Oldest first.
    Asc,
    /// Newest first (the default).
    #[default]
    Desc,
}

/// Parameters for a paginated notification listing.
#[derive(Debug, Clone)]
pub struct ListParams {
    /// 1-based page number.
    pub page: u64,
    /// Page size, clamped to [`ListParams::MAX_LIMIT`].
    pub limit: u64,
    /// Restrict to one notification type.
    pub notification_type: Option<NotificationType>,
    /// Restrict to one priority.
    pub priority: Option<NotificationPriority>,
    /// Restrict to read or unread records.
    pub is_read: Option<bool>,
    /// Sort key.
    pub sort_by: SortBy,
    /// Sort direction.
    pub sort_order: SortOrder,
}

impl ListParams {
    /// Largest page size a caller can request.
    pub const MAX_LIMIT: u64 = 100;
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: 30,
            notification_type: None,
            priority: None,
            is_read: None,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
        }
    }
}

/// Notification repository for database operations.
#[derive(Clone)]
pub struct NotificationRepository {
    db: Arc<DatabaseConnection>,
}

impl NotificationRepository {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a notification by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<notification::Model>> {
        Notification::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get a notification by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<notification::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotificationNotFound(id.to_string()))
    }

    /// Create a new notification.
    pub async fn create(&self, model: notification::ActiveModel) -> AppResult<notification::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Update a notification. Callers stage exactly the fields they own so
    /// the write stays a single statement.
    pub async fn update(&self, model: notification::ActiveModel) -> AppResult<notification::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Mark a notification as read, scoped to its recipient so one tenant
    /// cannot touch another's records. Returns the record unchanged when it
    /// is already read, so `read_at` keeps its original value.
    pub async fn mark_as_read(
        &self,
        id: &str,
        recipient_id: &str,
    ) -> AppResult<notification::Model> {
        let record = Notification::find_by_id(id)
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
            .ok_or_else(|| AppError::NotificationNotFound(id.to_string()))?;
        if record.is_read {
            return Ok(record);
        }

        let mut active: notification::ActiveModel = record.into();
        active.is_read = Set(true);
        active.read_at = Set(Some(Utc::now().into()));
        self.update(active).await
    }

    /// Mark all unread notifications of a recipient as read. Returns how
    /// many rows changed.
    pub async fn mark_all_as_read(&self, recipient_id: &str) -> AppResult<u64> {
        use sea_orm::UpdateResult;

        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        let result: UpdateResult = Notification::update_many()
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .filter(notification::Column::IsRead.eq(false))
            .col_expr(notification::Column::IsRead, true.into())
            .col_expr(notification::Column::ReadAt, Expr::value(Some(now)))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Count unread notifications for a recipient. Cancelled and expired
    /// records do not count.
    pub async fn count_unread(
        &self,
        recipient_id: &str,
        recipient_type: Option<notification::ActorKind>,
    ) -> AppResult<u64> {
        let mut query = Notification::find()
            .filter(notification::Column::RecipientId.eq(recipient_id))
            .filter(notification::Column::IsRead.eq(false))
            .filter(notification::Column::Status.ne(NotificationStatus::Cancelled))
            .filter(Self::not_expired());

        if let Some(kind) = recipient_type {
            query = query.filter(notification::Column::RecipientType.eq(kind));
        }

        query
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Paginated, filterable listing for one recipient. Expired records are
    /// excluded. Returns the page and the total match count.
    pub async fn list_by_recipient(
        &self,
        recipient_id: &str,
        params: &ListParams,
    ) -> AppResult<(Vec<notification::Model>, u64)> {
        let mut condition = Condition::all()
            .add(notification::Column::RecipientId.eq(recipient_id))
            .add(Self::not_expired());

        if let Some(kind) = params.notification_type {
            condition = condition.add(notification::Column::NotificationType.eq(kind));
        }
        if let Some(priority) = params.priority {
            condition = condition.add(notification::Column::Priority.eq(priority));
        }
        if let Some(is_read) = params.is_read {
            condition = condition.add(notification::Column::IsRead.eq(is_read));
        }

        let total = Notification::find()
            .filter(condition.clone())
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let limit = params.limit.clamp(1, ListParams::MAX_LIMIT);
        let offset = params.page.max(1).saturating_sub(1) * limit;

        let mut query = Notification::find().filter(condition);
        query = match (params.sort_by, params.sort_order) {
            (SortBy::CreatedAt, SortOrder::Desc) => {
                query.order_by_desc(notification::Column::CreatedAt)
            }
            (SortBy::CreatedAt, SortOrder::Asc) => {
                query.order_by_asc(notification::Column::CreatedAt)
            }
            (SortBy::Priority, SortOrder::Desc) => {
                query.order_by_desc(notification::Column::Priority)
            }
            (SortBy::Priority, SortOrder::Asc) => {
                query.order_by_asc(notification::Column::Priority)
            }
        };

        let records = query
            .limit(limit)
            .offset(offset)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok((records, total))
    }

    /// Find failed notifications whose retry is due: attempts below the cap
    /// and `next_attempt_at` elapsed or never set. Leased and expired
    /// records are skipped.
    pub async fn find_due_for_retry(&self, limit: u64) -> AppResult<Vec<notification::Model>> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();

        Notification::find()
            .filter(notification::Column::Status.eq(NotificationStatus::Failed))
            .filter(
                Expr::col(notification::Column::Attempts)
                    .lt(Expr::col(notification::Column::MaxAttempts)),
            )
            .filter(
                Condition::any()
                    .add(notification::Column::NextAttemptAt.lte(now))
                    .add(notification::Column::NextAttemptAt.is_null()),
            )
            .filter(Self::not_expired())
            .filter(Self::not_leased(now))
            .order_by_asc(notification::Column::NextAttemptAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find pending notifications whose deferred-send time has passed.
    pub async fn find_due_scheduled(&self, limit: u64) -> AppResult<Vec<notification::Model>> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();

        Notification::find()
            .filter(notification::Column::Status.eq(NotificationStatus::Pending))
            .filter(notification::Column::ScheduledFor.lte(now))
            .filter(Self::not_expired())
            .filter(Self::not_leased(now))
            .order_by_asc(notification::Column::ScheduledFor)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find immediate-send notifications stuck in pending, e.g. because the
    /// process died between creation and the first delivery pass.
    pub async fn find_stale_pending(
        &self,
        older_than_minutes: i64,
        limit: u64,
    ) -> AppResult<Vec<notification::Model>> {
        let now = Utc::now();
        let cutoff: sea_orm::prelude::DateTimeWithTimeZone =
            (now - chrono::Duration::minutes(older_than_minutes)).into();

        Notification::find()
            .filter(notification::Column::Status.eq(NotificationStatus::Pending))
            .filter(notification::Column::ScheduledFor.is_null())
            .filter(notification::Column::CreatedAt.lt(cutoff))
            .filter(Self::not_expired())
            .filter(Self::not_leased(now.into()))
            .order_by_asc(notification::Column::CreatedAt)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Claim a record for one sweep pass by taking the `processing_until`
    /// lease. The conditional update makes the claim atomic: exactly one of
    /// two racing sweeps sees an affected row.
    pub async fn claim(
        &self,
        id: &str,
        lease_until: sea_orm::prelude::DateTimeWithTimeZone,
    ) -> AppResult<bool> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();

        let result = Notification::update_many()
            .filter(notification::Column::Id.eq(id))
            .filter(
                Condition::any()
                    .add(notification::Column::ProcessingUntil.is_null())
                    .add(notification::Column::ProcessingUntil.lt(now)),
            )
            .col_expr(
                notification::Column::ProcessingUntil,
                Expr::value(Some(lease_until)),
            )
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected == 1)
    }

    /// Release a claim without recording an outcome. Used when delivery
    /// could not even start.
    pub async fn release_claim(&self, id: &str) -> AppResult<()> {
        Notification::update_many()
            .filter(notification::Column::Id.eq(id))
            .col_expr(notification::Column::ProcessingUntil, Expr::value(Option::<sea_orm::prelude::DateTimeWithTimeZone>::None))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete expired notifications. Runs from the cleanup sweep only.
    pub async fn delete_expired(&self) -> AppResult<u64> {
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();

        let result = Notification::delete_many()
            .filter(notification::Column::ExpiresAt.lte(now))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    /// Delete read notifications older than the retention window, skipping
    /// anything that still has an unresolved retry.
    pub async fn delete_old_read(&self, older_than_days: i64) -> AppResult<u64> {
        let cutoff: sea_orm::prelude::DateTimeWithTimeZone =
            (Utc::now() - chrono::Duration::days(older_than_days)).into();

        let result = Notification::delete_many()
            .filter(notification::Column::IsRead.eq(true))
            .filter(notification::Column::CreatedAt.lt(cutoff))
            .filter(
                Condition::any()
                    .add(notification::Column::Status.ne(NotificationStatus::Failed))
                    .add(
                        Expr::col(notification::Column::Attempts)
                            .gte(Expr::col(notification::Column::MaxAttempts)),
                    ),
            )
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(result.rows_affected)
    }

    fn not_expired() -> Condition {
        let now: sea_orm::prelude::DateTimeWithTimeZone = Utc::now().into();
        Condition::any()
            .add(notification::Column::ExpiresAt.is_null())
            .add(notification::Column::ExpiresAt.gt(now))
    }

    fn not_leased(now: sea_orm::prelude::DateTimeWithTimeZone) -> Condition {
        Condition::any()
            .add(notification::Column::ProcessingUntil.is_null())
            .add(notification::Column::ProcessingUntil.lt(now))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entities::notification::{
        ActorKind, ChannelSelection, ChannelStates, NotificationPriority, NotificationStatus,
        NotificationType,
    };
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_notification(id: &str, recipient_id: &str) -> notification::Model {
        notification::Model {
            id: id.to_string(),
            recipient_id: recipient_id.to_string(),
            recipient_type: ActorKind::Admin,
            sender_id: None,
            sender_type: None,
            notification_type: NotificationType::OrderComment,
            priority: NotificationPriority::Normal,
            title: "New comment on order #1042".to_string(),
            message: "A comment was added".to_string(),
            order_id: Some("order-1042".to_string()),
            comment_id: None,
            product_id: None,
            data: None,
            channels: ChannelStates::from_selection(ChannelSelection {
                email: true,
                sms: false,
                push: true,
                in_app: true,
            }),
            status: NotificationStatus::Pending,
            is_read: false,
            read_at: None,
            attempts: 0,
            max_attempts: 3,
            last_attempt_at: None,
            next_attempt_at: None,
            scheduled_for: None,
            expires_at: None,
            processing_until: None,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_by_id() {
        let record = create_test_notification("n1", "admin1");
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[record.clone()]])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let result = repo.find_by_id("n1").await.unwrap();
        assert!(result.is_some());
        assert_eq!(result.unwrap().id, "n1");
    }

    #[tokio::test]
    async fn test_get_by_id_not_found() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<notification::Model>::new()])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let result = repo.get_by_id("missing").await;
        assert!(matches!(result, Err(AppError::NotificationNotFound(_))));
    }

    #[tokio::test]
    async fn test_mark_as_read_sets_both_fields() {
        let record = create_test_notification("n1", "admin1");
        let mut updated = record.clone();
        updated.is_read = true;
        updated.read_at = Some(Utc::now().into());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![record], vec![updated]])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let result = repo.mark_as_read("n1", "admin1").await.unwrap();
        assert!(result.is_read);
        assert!(result.read_at.is_some());
    }

    #[tokio::test]
    async fn test_mark_as_read_rejects_foreign_recipient() {
        // The recipient filter keeps the lookup empty.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<notification::Model>::new()])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let result = repo.mark_as_read("n1", "someone-else").await;
        assert!(matches!(result, Err(AppError::NotificationNotFound(_))));
    }

    #[tokio::test]
    async fn test_mark_as_read_is_idempotent() {
        let mut record = create_test_notification("n1", "admin1");
        record.is_read = true;
        record.read_at = Some(Utc::now().into());

        // Only the lookup hits the database; no update round trip follows.
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[record.clone()]])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let result = repo.mark_as_read("n1", "admin1").await.unwrap();
        assert_eq!(result.read_at, record.read_at);
    }

    #[tokio::test]
    async fn test_mark_all_as_read_returns_affected_count() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 5,
                }])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let count = repo.mark_all_as_read("admin1").await.unwrap();
        assert_eq!(count, 5);
    }

    #[tokio::test]
    async fn test_count_unread() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(4))
                }]])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let count = repo.count_unread("admin1", None).await.unwrap();
        assert_eq!(count, 4);
    }

    #[tokio::test]
    async fn test_list_by_recipient_returns_page_and_total() {
        let records = vec![
            create_test_notification("n1", "admin1"),
            create_test_notification("n2", "admin1"),
        ];
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(12))
                }]])
                .append_query_results([records])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let (page, total) = repo
            .list_by_recipient("admin1", &ListParams::default())
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(total, 12);
    }

    #[tokio::test]
    async fn test_find_due_for_retry() {
        let mut record = create_test_notification("n1", "admin1");
        record.status = NotificationStatus::Failed;
        record.attempts = 1;
        record.next_attempt_at = Some((Utc::now() - chrono::Duration::minutes(1)).into());

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[record]])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let due = repo.find_due_for_retry(100).await.unwrap();
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].status, NotificationStatus::Failed);
    }

    #[tokio::test]
    async fn test_find_due_for_retry_filters_on_schedule_and_cap() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<notification::Model>::new()])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db.clone());
        repo.find_due_for_retry(100).await.unwrap();
        drop(repo);

        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        let sql = format!("{:?}", log[0]);
        // A record is only due once its backoff timestamp has elapsed (or
        // was never set), its attempt cap is not spent, and nothing else
        // holds its lease.
        assert!(sql.contains("next_attempt_at"));
        assert!(sql.contains("max_attempts"));
        assert!(sql.contains("processing_until"));
        assert!(sql.contains("expires_at"));
    }

    #[tokio::test]
    async fn test_mark_all_as_read_scopes_to_recipient() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                }])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db.clone());
        repo.mark_all_as_read("admin1").await.unwrap();
        drop(repo);

        let log = Arc::try_unwrap(db).ok().unwrap().into_transaction_log();
        let sql = format!("{:?}", log[0]);
        // The bulk update filters on the recipient and only touches unread
        // rows; other recipients' records stay out of the statement.
        assert!(sql.contains("recipient_id"));
        assert!(sql.contains("admin1"));
        assert!(sql.contains("is_read"));
    }

    #[tokio::test]
    async fn test_claim_succeeds_when_lease_free() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let lease = (Utc::now() + chrono::Duration::minutes(5)).into();
        assert!(repo.claim("n1", lease).await.unwrap());
    }

    #[tokio::test]
    async fn test_claim_fails_when_already_leased() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                }])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let lease = (Utc::now() + chrono::Duration::minutes(5)).into();
        assert!(!repo.claim("n1", lease).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_old_read_reports_count() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 7,
                }])
                .into_connection(),
        );

        let repo = NotificationRepository::new(db);
        let deleted = repo.delete_old_read(30).await.unwrap();
        assert_eq!(deleted, 7);
    }
}
