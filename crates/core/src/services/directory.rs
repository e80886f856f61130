//! Recipient directory.
//!
//! The notification core never reaches into the marketplace's user or admin
//! schemas directly; it resolves recipients through this trait. The default
//! implementation is backed by the `recipient` contact table.

use async_trait::async_trait;
use std::sync::Arc;

use tradehub_common::AppResult;
use tradehub_db::entities::notification::ActorKind;
use tradehub_db::entities::recipient;
use tradehub_db::repositories::RecipientRepository;

/// Contact details for one resolvable recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    /// Recipient ID.
    pub id: String,
    /// Kind of actor.
    pub kind: ActorKind,
    /// Name used in rendered greetings.
    pub display_name: String,
    /// Email address, if on file.
    pub email: Option<String>,
    /// Phone number, if on file.
    pub phone: Option<String>,
}

impl From<recipient::Model> for Contact {
    fn from(model: recipient::Model) -> Self {
        Self {
            id: model.id,
            kind: model.recipient_type,
            display_name: model.display_name,
            email: model.email,
            phone: model.phone,
        }
    }
}

/// Lookup interface for notification targets.
#[async_trait]
pub trait RecipientDirectory: Send + Sync {
    /// Resolve one recipient to contact details. `None` when the recipient
    /// does not exist or is inactive.
    async fn get_recipient(&self, id: &str, kind: ActorKind) -> AppResult<Option<Contact>>;

    /// All active admin contacts, for admin-audience fan-out.
    async fn active_admins(&self) -> AppResult<Vec<Contact>>;
}

/// Shared handle to a directory implementation.
pub type DirectoryService = Arc<dyn RecipientDirectory>;

/// Directory backed by the `recipient` contact table.
#[derive(Clone)]
pub struct DbRecipientDirectory {
    repo: RecipientRepository,
}

impl DbRecipientDirectory {
    /// Create a database-backed directory.
    #[must_use]
    pub const fn new(repo: RecipientRepository) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl RecipientDirectory for DbRecipientDirectory {
    async fn get_recipient(&self, id: &str, kind: ActorKind) -> AppResult<Option<Contact>> {
        Ok(self.repo.find_active(id, kind).await?.map(Contact::from))
    }

    async fn active_admins(&self) -> AppResult<Vec<Contact>> {
        Ok(self
            .repo
            .find_active_admins()
            .await?
            .into_iter()
            .map(Contact::from)
            .collect())
    }
}

/// Fixed in-memory directory. Used in tests and as a seed-free default for
/// local development.
#[derive(Clone, Default)]
pub struct StaticDirectory {
    contacts: Vec<Contact>,
}

impl StaticDirectory {
    /// Create a directory over a fixed contact list.
    #[must_use]
    pub fn new(contacts: Vec<Contact>) -> Self {
        Self { contacts }
    }
}

#[async_trait]
impl RecipientDirectory for StaticDirectory {
    async fn get_recipient(&self, id: &str, kind: ActorKind) -> AppResult<Option<Contact>> {
        Ok(self
            .contacts
            .iter()
            .find(|c| c.id == id && c.kind == kind)
            .cloned())
    }

    async fn active_admins(&self) -> AppResult<Vec<Contact>> {
        Ok(self
            .contacts
            .iter()
            .filter(|c| c.kind == ActorKind::Admin)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn contact(id: &str, kind: ActorKind) -> Contact {
        Contact {
            id: id.to_string(),
            kind,
            display_name: format!("Contact {id}"),
            email: Some(format!("{id}@example.com")),
            phone: None,
        }
    }

    #[tokio::test]
    async fn static_directory_resolves_by_id_and_kind() {
        let directory = StaticDirectory::new(vec![
            contact("u1", ActorKind::User),
            contact("a1", ActorKind::Admin),
        ]);

        let found = directory.get_recipient("u1", ActorKind::User).await.unwrap();
        assert!(found.is_some());

        // Same ID, wrong kind.
        let missing = directory.get_recipient("u1", ActorKind::Admin).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn static_directory_lists_admins_only() {
        let directory = StaticDirectory::new(vec![
            contact("u1", ActorKind::User),
            contact("a1", ActorKind::Admin),
            contact("a2", ActorKind::Admin),
        ]);

        let admins = directory.active_admins().await.unwrap();
        assert_eq!(admins.len(), 2);
        assert!(admins.iter().all(|c| c.kind == ActorKind::Admin));
    }
}
