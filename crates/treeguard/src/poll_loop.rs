//! Sequential polling loop.
//!
//! Each cycle runs to completion on a blocking task. Shutdown is only
//! observed between cycles: before a cycle starts and while sleeping.

use crate::deliver::{Delivery, Mode};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use treeguard_core::{Monitor, Snapshot};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchSummary {
    pub cycles: u64,
    /// Cycles whose snapshot could not be saved.
    pub degraded_cycles: u64,
}

pub async fn run_watch(
    monitor: Arc<Monitor>,
    mut current: Snapshot,
    interval: Duration,
    delivery: &Delivery,
    mut shutdown: watch::Receiver<bool>,
) -> Result<WatchSummary> {
    info!(interval_secs = interval.as_secs(), "watch loop started");
    let mut summary = WatchSummary::default();
    let mut degraded_streak = 0u64;

    loop {
        if *shutdown.borrow() {
            break;
        }

        let cycle_monitor = monitor.clone();
        let (next, outcome) = tokio::task::spawn_blocking(move || {
            let outcome = cycle_monitor.run_cycle(&mut current);
            (current, outcome)
        })
        .await?;
        current = next;
        summary.cycles += 1;

        if outcome.persistence.is_degraded() {
            summary.degraded_cycles += 1;
            degraded_streak += 1;
            warn!(consecutive = degraded_streak, "snapshot persistence degraded");
        } else {
            degraded_streak = 0;
        }

        delivery.deliver(&outcome, Mode::Watch);

        debug!(secs = interval.as_secs(), "waiting for next cycle");
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    info!(cycles = summary.cycles, "watch loop stopped");
    Ok(summary)
}
