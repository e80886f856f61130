//! HTTP API layer for the notification pipeline.
//!
//! This crate provides the REST API:
//!
//! - **Endpoints**: notification creation, delivery, retry and the read side
//! - **State**: shared handles to the factory, coordinator and query service
//! - **Responses**: a uniform `{"success": true, "data": …}` envelope
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod response;
pub mod state;

pub use endpoints::router;
pub use state::AppState;
