//! Concrete sweep executor.
//!
//! Loads due records in batches, claims each one with a lease and hands it
//! to the delivery coordinator. A record whose delivery pass errors gets its
//! claim released so the next sweep can pick it up again.

use std::sync::Arc;

use chrono::Utc;

use tradehub_common::config::SchedulerConfig;
use tradehub_core::DeliveryCoordinator;
use tradehub_db::entities::notification;
use tradehub_db::repositories::NotificationRepository;

use crate::scheduler::JobExecutor;

/// Immediate-send records still pending after this many minutes are treated
/// as dropped by a crashed process and swept up again.
const STALE_PENDING_MINUTES: i64 = 5;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Sweep executor backed by the notification repository and the delivery
/// coordinator.
#[derive(Clone)]
pub struct NotificationJobExecutor {
    repo: NotificationRepository,
    coordinator: Arc<DeliveryCoordinator>,
    batch_size: u64,
    claim_lease: chrono::Duration,
    retention_days: i64,
}

impl NotificationJobExecutor {
    /// Create an executor from configuration.
    #[must_use]
    pub fn new(
        repo: NotificationRepository,
        coordinator: Arc<DeliveryCoordinator>,
        config: &SchedulerConfig,
    ) -> Self {
        Self {
            repo,
            coordinator,
            batch_size: config.retry_batch_size,
            claim_lease: chrono::Duration::seconds(config.claim_lease_secs),
            retention_days: config.retention_days,
        }
    }

    /// Claim one record and run a delivery pass on it. Returns whether this
    /// sweep owned the record; a lost claim race is not an error.
    async fn deliver_claimed(&self, record: notification::Model) -> Result<bool, BoxError> {
        let lease_until = (Utc::now() + self.claim_lease).into();
        if !self.repo.claim(&record.id, lease_until).await? {
            tracing::debug!(notification_id = %record.id, "Record claimed by another sweep");
            return Ok(false);
        }

        let id = record.id.clone();
        if let Err(e) = self.coordinator.deliver(record).await {
            tracing::error!(notification_id = %id, error = %e, "Delivery pass failed");
            self.repo.release_claim(&id).await?;
        }
        Ok(true)
    }

    /// Run a batch of due records through `deliver_claimed`. A record whose
    /// claim or release errors is logged and skipped; the batch never aborts.
    async fn process_batch(&self, due: Vec<notification::Model>) -> u64 {
        let mut processed = 0;
        for record in due {
            let id = record.id.clone();
            match self.deliver_claimed(record).await {
                Ok(true) => processed += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::error!(notification_id = %id, error = %e, "Sweep skipped record");
                }
            }
        }
        processed
    }
}

#[async_trait::async_trait]
impl JobExecutor for NotificationJobExecutor {
    async fn process_due_retries(&self) -> Result<u64, BoxError> {
        let due = self.repo.find_due_for_retry(self.batch_size).await?;
        Ok(self.process_batch(due).await)
    }

    async fn process_due_scheduled(&self) -> Result<u64, BoxError> {
        let mut due = self.repo.find_due_scheduled(self.batch_size).await?;
        due.extend(
            self.repo
                .find_stale_pending(STALE_PENDING_MINUTES, self.batch_size)
                .await?,
        );
        Ok(self.process_batch(due).await)
    }

    async fn cleanup_notifications(&self) -> Result<u64, BoxError> {
        let expired = self.repo.delete_expired().await?;
        let old_read = self.repo.delete_old_read(self.retention_days).await?;
        if expired > 0 || old_read > 0 {
            tracing::debug!(expired, old_read, "Cleanup sweep removed records");
        }
        Ok(expired + old_read)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
    use tradehub_common::Config;
    use tradehub_core::DeliveryTransports;
    use tradehub_core::services::StaticDirectory;
    use tradehub_db::entities::notification::{
        ActorKind, ChannelSelection, ChannelStates, NotificationPriority, NotificationStatus,
        NotificationType,
    };

    fn failed_record(id: &str) -> notification::Model {
        notification::Model {
            id: id.to_string(),
            recipient_id: "u1".to_string(),
            recipient_type: ActorKind::User,
            sender_id: None,
            sender_type: None,
            notification_type: NotificationType::Reminder,
            priority: NotificationPriority::Normal,
            title: "Reminder: review order".to_string(),
            message: "Order #1042 awaits review.".to_string(),
            order_id: None,
            comment_id: None,
            product_id: None,
            data: None,
            channels: ChannelStates::from_selection(ChannelSelection {
                email: false,
                sms: false,
                push: false,
                in_app: true,
            }),
            status: NotificationStatus::Failed,
            is_read: false,
            read_at: None,
            attempts: 1,
            max_attempts: 3,
            last_attempt_at: Some(Utc::now().into()),
            next_attempt_at: Some((Utc::now() - chrono::Duration::minutes(1)).into()),
            scheduled_for: None,
            expires_at: None,
            processing_until: None,
            created_at: Utc::now().into(),
        }
    }

    fn executor(db: sea_orm::DatabaseConnection) -> NotificationJobExecutor {
        let repo = NotificationRepository::new(Arc::new(db));
        let coordinator = Arc::new(DeliveryCoordinator::new(
            repo.clone(),
            Arc::new(StaticDirectory::default()),
            DeliveryTransports::default(),
            &Config::default(),
        ));
        NotificationJobExecutor::new(repo, coordinator, &SchedulerConfig::default())
    }

    #[tokio::test]
    async fn retry_sweep_claims_and_delivers() {
        let record = failed_record("n1");
        let mut delivered = record.clone();
        delivered.status = NotificationStatus::Delivered;
        delivered.attempts = 2;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // find_due_for_retry, then the settle update's RETURNING row
            .append_query_results([vec![record], vec![delivered]])
            // claim succeeds
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let processed = executor(db).process_due_retries().await.unwrap();
        assert_eq!(processed, 1);
    }

    #[tokio::test]
    async fn claim_error_does_not_abort_the_batch() {
        let first = failed_record("n1");
        let second = failed_record("n2");
        let mut delivered = second.clone();
        delivered.status = NotificationStatus::Delivered;
        delivered.attempts = 2;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // find_due_for_retry, then the second record's settle RETURNING row
            .append_query_results([vec![first, second], vec![delivered]])
            // the first record's claim hits an infrastructure error, the
            // second claim succeeds
            .append_exec_errors([sea_orm::DbErr::Custom("connection reset".to_string())])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let processed = executor(db).process_due_retries().await.unwrap();
        assert_eq!(processed, 1);
    }

    #[tokio::test]
    async fn lost_claim_race_is_skipped() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![failed_record("n1")]])
            // another sweep holds the lease
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let processed = executor(db).process_due_retries().await.unwrap();
        assert_eq!(processed, 0);
    }

    #[tokio::test]
    async fn cleanup_sums_both_deletions() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 2,
                },
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 3,
                },
            ])
            .into_connection();

        let removed = executor(db).cleanup_notifications().await.unwrap();
        assert_eq!(removed, 5);
    }

    #[tokio::test]
    async fn scheduled_sweep_includes_stale_pending() {
        let mut pending = failed_record("n1");
        pending.status = NotificationStatus::Pending;
        pending.next_attempt_at = None;
        let mut delivered = pending.clone();
        delivered.status = NotificationStatus::Delivered;
        delivered.attempts = 2;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            // find_due_scheduled empty, find_stale_pending one record, then
            // the settle update's RETURNING row
            .append_query_results([
                Vec::<notification::Model>::new(),
                vec![pending],
                vec![delivered],
            ])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 1,
            }])
            .into_connection();

        let processed = executor(db).process_due_scheduled().await.unwrap();
        assert_eq!(processed, 1);
    }
}
