//! Clock abstraction for the orchestrator's fixed delays

use std::time::Duration;

use async_trait::async_trait;

/// Something that can wait.
///
/// The orchestrator never sleeps on its own; tests drive it on tokio's
/// paused clock through [`TokioScheduler`].
#[async_trait]
pub trait Scheduler: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Scheduler backed by `tokio::time`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

#[async_trait]
impl Scheduler for TokioScheduler {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}
