//! Notification pipeline core.
//!
//! The factory turns domain events into persisted records, the delivery
//! coordinator fans them out across channels, and the query service serves
//! the read side. Channel transports and the recipient directory sit behind
//! traits so the pipeline never depends on a concrete provider.

pub mod services;

pub use services::{
    DeliveryCoordinator, DeliveryTransports, NotificationEvent, NotificationFactory,
    NotificationQueryService,
};
