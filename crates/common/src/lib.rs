//! Common utilities and shared types for the Trade Hub notification service.
//!
//! This crate provides foundational components used across all service crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Retry policy**: Exponential backoff via [`RetryPolicy`]
//!
//! # Example
//!
//! ```no_run
//! use tradehub_common::{AppResult, Config, IdGenerator};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod retry;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use retry::RetryPolicy;
