use std::time::Duration;

use async_trait::async_trait;

/// Awaited after every call that mutates the destination.
#[async_trait]
pub trait Pacer: Send + Sync {
    async fn pause(&self);
}

pub struct FixedInterval(pub Duration);

#[async_trait]
impl Pacer for FixedInterval {
    async fn pause(&self) {
        if !self.0.is_zero() {
            tokio::time::sleep(self.0).await;
        }
    }
}

pub struct NoDelay;

#[async_trait]
impl Pacer for NoDelay {
    async fn pause(&self) {}
}

pub fn from_delay(delay: Duration) -> Box<dyn Pacer> {
    if delay.is_zero() {
        Box::new(NoDelay)
    } else {
        Box::new(FixedInterval(delay))
    }
}
