use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Wait between polls.
///
/// Injected into the poller so the retry cadence can be observed without
/// real sleeps.
#[async_trait]
pub trait RetryTimer: Send + Sync {
    async fn wait(&self, duration: Duration);
}

#[async_trait]
impl<T: RetryTimer + ?Sized> RetryTimer for Arc<T> {
    async fn wait(&self, duration: Duration) {
        (**self).wait(duration).await;
    }
}

/// `tokio::time::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

#[async_trait]
impl RetryTimer for TokioTimer {
    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
