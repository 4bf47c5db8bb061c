//! Background expiration monitor.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::manager::ManagerShared;
use super::traits::Clock;
use crate::platform::Platform;

/// Sweep loop. Sleeps are best-effort: a tick may fire late but never
/// early, so a lease lives at least its full duration and at most one
/// period longer.
pub(crate) async fn run<P: Platform, C: Clock>(
    shared: Arc<ManagerShared<P, C>>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Skip the first immediate tick.
    ticker.tick().await;

    debug!("Expiration monitor started (period {period:?})");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        shared.sweep_expired().await;
    }

    debug!("Expiration monitor stopped");
}
