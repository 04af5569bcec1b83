// src/monitor.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::client::Inner;

/// Recurring liveness loop: one health check per tick, never overlapping.
/// Ends on the shutdown signal, or once the owning client is gone.
pub(crate) fn spawn(
    inner: &Arc<Inner>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let weak = Arc::downgrade(inner);
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = shutdown.changed() => break,
            }
            let Some(inner) = weak.upgrade() else { break };
            inner.health_check().await;
        }
    })
}
