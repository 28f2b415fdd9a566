//! `setTimeout`-backed [`Timer`].

use async_trait::async_trait;
use bridge_traits::time::Timer;
use std::time::Duration;

/// Delay source driven by the browser event loop.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlooTimer;

#[async_trait(?Send)]
impl Timer for GlooTimer {
    async fn sleep(&self, duration: Duration) {
        gloo_timers::future::sleep(duration).await;
    }
}
