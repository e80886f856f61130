//! Background processing for the notification pipeline.
//!
//! Periodic in-process sweeps over the notification table:
//!
//! - **Retry**: failed records whose backoff has elapsed
//! - **Scheduled**: pending records whose send time has passed
//! - **Cleanup**: expired records and old read records
//!
//! Every sweep claims a record with a lease before delivering, so multiple
//! server instances can run the scheduler concurrently.

pub mod executor;
pub mod scheduler;

pub use executor::NotificationJobExecutor;
pub use scheduler::{JobExecutor, SchedulerConfig, run_scheduler};
