//! Tokio-backed [`Timer`] implementation.

use async_trait::async_trait;
use bridge_traits::time::Timer;
use std::time::Duration;

/// Delays on the Tokio timer wheel.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioTimer;

#[async_trait]
impl Timer for TokioTimer {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
