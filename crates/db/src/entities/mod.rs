//! Database entities.

pub mod notification;
pub mod recipient;

pub use notification::Entity as Notification;
pub use recipient::Entity as Recipient;
