//! Read-side operations for the notification feed.
//!
//! Thin service over the repository: listings, unread counts and the read
//! flag. All operations are scoped to one recipient.

use tradehub_db::entities::notification::{self, ActorKind};
use tradehub_db::repositories::{ListParams, NotificationRepository};

use tradehub_common::AppResult;

/// Read-side notification queries.
#[derive(Clone)]
pub struct NotificationQueryService {
    repo: NotificationRepository,
}

impl NotificationQueryService {
    /// Create a query service.
    #[must_use]
    pub const fn new(repo: NotificationRepository) -> Self {
        Self { repo }
    }

    /// Paginated, filterable feed for one recipient. Returns the page and
    /// the total match count.
    pub async fn list(
        &self,
        recipient_id: &str,
        params: &ListParams,
    ) -> AppResult<(Vec<notification::Model>, u64)> {
        self.repo.list_by_recipient(recipient_id, params).await
    }

    /// Unread badge count for one recipient.
    pub async fn unread_count(
        &self,
        recipient_id: &str,
        recipient_type: Option<ActorKind>,
    ) -> AppResult<u64> {
        self.repo.count_unread(recipient_id, recipient_type).await
    }

    /// Mark one notification as read. Idempotent; a repeat call keeps the
    /// original `read_at`.
    pub async fn mark_as_read(
        &self,
        notification_id: &str,
        recipient_id: &str,
    ) -> AppResult<notification::Model> {
        self.repo.mark_as_read(notification_id, recipient_id).await
    }

    /// Mark every unread notification of a recipient as read. Returns how
    /// many records changed.
    pub async fn mark_all_as_read(&self, recipient_id: &str) -> AppResult<u64> {
        self.repo.mark_all_as_read(recipient_id).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use std::sync::Arc;
    use tradehub_common::AppError;

    #[tokio::test]
    async fn unread_count_passes_through() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[maplit::btreemap! {
                    "num_items" => sea_orm::Value::BigInt(Some(3))
                }]])
                .into_connection(),
        );

        let service = NotificationQueryService::new(NotificationRepository::new(db));
        let count = service.unread_count("admin1", None).await.unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn mark_as_read_requires_matching_recipient() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<notification::Model>::new()])
                .into_connection(),
        );

        let service = NotificationQueryService::new(NotificationRepository::new(db));
        let result = service.mark_as_read("n1", "someone-else").await;
        assert!(matches!(result, Err(AppError::NotificationNotFound(_))));
    }

    #[tokio::test]
    async fn mark_all_as_read_reports_count() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 4,
                }])
                .into_connection(),
        );

        let service = NotificationQueryService::new(NotificationRepository::new(db));
        assert_eq!(service.mark_all_as_read("admin1").await.unwrap(), 4);
    }
}
