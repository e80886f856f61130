//! Notification services.

pub mod delivery;
pub mod directory;
pub mod email;
pub mod factory;
pub mod push;
pub mod query;
pub mod sms;
pub mod templates;

pub use delivery::{DeliveryCoordinator, DeliveryTransports};
pub use directory::{Contact, DbRecipientDirectory, DirectoryService, RecipientDirectory, StaticDirectory};
pub use email::{EmailService, build_email_transport};
pub use factory::{ActorRef, CreateOptions, NotificationEvent, NotificationFactory, RecipientSpec};
pub use push::{PushService, build_push_transport};
pub use query::NotificationQueryService;
pub use sms::{SmsService, build_sms_transport};
