//! Recipient repository.

use std::sync::Arc;

use crate::entities::{Recipient, recipient};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tradehub_common::{AppError, AppResult};

use crate::entities::notification::ActorKind;

/// Recipient repository for database operations.
#[derive(Clone)]
pub struct RecipientRepository {
    db: Arc<DatabaseConnection>,
}

impl RecipientRepository {
    /// Create a new recipient repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find an active recipient by ID and kind.
    pub async fn find_active(
        &self,
        id: &str,
        kind: ActorKind,
    ) -> AppResult<Option<recipient::Model>> {
        Recipient::find_by_id(id)
            .filter(recipient::Column::RecipientType.eq(kind))
            .filter(recipient::Column::IsActive.eq(true))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// All active admin contacts, used for admin-audience fan-out.
    pub async fn find_active_admins(&self) -> AppResult<Vec<recipient::Model>> {
        Recipient::find()
            .filter(recipient::Column::RecipientType.eq(ActorKind::Admin))
            .filter(recipient::Column::IsActive.eq(true))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a recipient contact row.
    pub async fn create(&self, model: recipient::ActiveModel) -> AppResult<recipient::Model> {
        model
            .insert(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn create_test_recipient(id: &str, kind: ActorKind) -> recipient::Model {
        recipient::Model {
            id: id.to_string(),
            recipient_type: kind,
            display_name: "Dana Ops".to_string(),
            email: Some("dana@example.com".to_string()),
            phone: None,
            is_active: true,
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn test_find_active() {
        let contact = create_test_recipient("admin1", ActorKind::Admin);
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[contact]])
                .into_connection(),
        );

        let repo = RecipientRepository::new(db);
        let result = repo.find_active("admin1", ActorKind::Admin).await.unwrap();
        assert!(result.is_some());
        assert_eq!(result.unwrap().display_name, "Dana Ops");
    }

    #[tokio::test]
    async fn test_find_active_admins() {
        let admins = vec![
            create_test_recipient("admin1", ActorKind::Admin),
            create_test_recipient("admin2", ActorKind::Admin),
        ];
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([admins])
                .into_connection(),
        );

        let repo = RecipientRepository::new(db);
        let result = repo.find_active_admins().await.unwrap();
        assert_eq!(result.len(), 2);
    }
}
