//! Database repositories.

mod notification;
mod recipient;

pub use notification::{ListParams, NotificationRepository, SortBy, SortOrder};
pub use recipient::RecipientRepository;
