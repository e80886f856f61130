//! Periodic sweeps over the notification table.
//!
//! Three independent interval loops: due retries, due scheduled sends and
//! cleanup. The loops only know the [`JobExecutor`] trait; the concrete
//! executor lives in [`crate::executor`].

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;

/// Sweep intervals.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Interval between retry sweeps (default: 1 minute).
    pub retry_interval: Duration,
    /// Interval between scheduled-send sweeps (default: 30 seconds).
    pub scheduled_interval: Duration,
    /// Interval between cleanup sweeps (default: 1 hour).
    pub cleanup_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            retry_interval: Duration::from_secs(60),
            scheduled_interval: Duration::from_secs(30),
            cleanup_interval: Duration::from_secs(3600),
        }
    }
}

impl From<&tradehub_common::config::SchedulerConfig> for SchedulerConfig {
    fn from(config: &tradehub_common::config::SchedulerConfig) -> Self {
        Self {
            retry_interval: Duration::from_secs(config.retry_interval_secs),
            scheduled_interval: Duration::from_secs(config.scheduled_interval_secs),
            cleanup_interval: Duration::from_secs(config.cleanup_interval_secs),
        }
    }
}

/// Job executor trait for the periodic sweeps.
#[async_trait::async_trait]
pub trait JobExecutor: Send + Sync {
    /// Deliver failed notifications whose retry is due. Returns how many
    /// records were processed.
    async fn process_due_retries(&self) -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;

    /// Deliver pending notifications whose scheduled time has passed,
    /// including immediate sends stuck in pending. Returns how many records
    /// were processed.
    async fn process_due_scheduled(&self) -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;

    /// Delete expired and stale read notifications. Returns how many rows
    /// were removed.
    async fn cleanup_notifications(&self)
    -> Result<u64, Box<dyn std::error::Error + Send + Sync>>;
}

/// Run the scheduler with the given configuration and executor.
pub async fn run_scheduler<E: JobExecutor + 'static>(config: SchedulerConfig, executor: Arc<E>) {
    let executor_retry = executor.clone();
    let executor_scheduled = executor.clone();
    let executor_cleanup = executor;

    let retry_interval = config.retry_interval;
    let scheduled_interval = config.scheduled_interval;
    let cleanup_interval = config.cleanup_interval;

    // Spawn retry sweep task
    tokio::spawn(async move {
        let mut interval = interval(retry_interval);
        loop {
            interval.tick().await;
            match executor_retry.process_due_retries().await {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!(count, "Processed due retries");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Retry sweep failed");
                }
            }
        }
    });

    // Spawn scheduled-send sweep task
    tokio::spawn(async move {
        let mut interval = interval(scheduled_interval);
        loop {
            interval.tick().await;
            match executor_scheduled.process_due_scheduled().await {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!(count, "Processed due scheduled notifications");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Scheduled-send sweep failed");
                }
            }
        }
    });

    // Spawn cleanup sweep task
    tokio::spawn(async move {
        let mut interval = interval(cleanup_interval);
        loop {
            interval.tick().await;
            match executor_cleanup.cleanup_notifications().await {
                Ok(count) => {
                    if count > 0 {
                        tracing::info!(count, "Cleaned up notifications");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Cleanup sweep failed");
                }
            }
        }
    });
}
