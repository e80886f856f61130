//! Shared application state.

use std::sync::Arc;

use tradehub_core::{DeliveryCoordinator, NotificationFactory, NotificationQueryService};

/// Application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Turns events into records.
    pub factory: NotificationFactory,
    /// Runs delivery passes.
    pub coordinator: Arc<DeliveryCoordinator>,
    /// Read-side queries.
    pub query: NotificationQueryService,
}

impl AppState {
    /// Bundle the services into one state value.
    #[must_use]
    pub const fn new(
        factory: NotificationFactory,
        coordinator: Arc<DeliveryCoordinator>,
        query: NotificationQueryService,
    ) -> Self {
        Self {
            factory,
            coordinator,
            query,
        }
    }
}
