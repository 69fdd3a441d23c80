//! Hot reload: debounced, cooled-down, single-flight reload batches.
//!
//! # Data Flow
//! ```text
//! notify watcher thread
//!     → change events, filtered to known source files
//!     → config names over an unbounded channel
//!     → coordinator task: pending set + one re-armed timer
//!         batch delay elapses (no newer event)
//!             → cooldown not yet over?   re-arm for the remainder
//!             → a load already running?  re-arm for a short retry
//!             → otherwise drain the set, reload serially, notify once
//! ```
//!
//! # Design Decisions
//! - Every event resets the timer, so a burst of saves coalesces into one
//!   batch and reload work starts only when the editor goes quiet.
//! - Batches reload serially; the parallelism of the initial load buys
//!   nothing when the store write per name is the bottleneck.
//! - The coordinator never drops a batch: claimed-flag races and cooldown
//!   both re-queue, delayed.

mod watcher;

pub(crate) use watcher::SourceWatcher;

use std::collections::HashSet;
use std::time::Duration;

use notify::RecommendedWatcher;
use tokio::sync::{broadcast, mpsc};
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::engine::ConfigEngine;

/// Spacing of retries when a reload finds another load pass in flight.
const RETRY_DELAY: Duration = Duration::from_millis(100);

/// Park interval for the timer while no batch is pending.
const IDLE_PARK: Duration = Duration::from_secs(86_400);

/// Keeps hot reload running; stop it explicitly or by dropping it.
///
/// Dropping the handle releases the filesystem watch and shuts the
/// coordinator task down.
pub struct WatchHandle {
    _watcher: RecommendedWatcher,
    shutdown: broadcast::Sender<()>,
}

impl WatchHandle {
    pub(crate) fn new(watcher: RecommendedWatcher, shutdown: broadcast::Sender<()>) -> Self {
        Self {
            _watcher: watcher,
            shutdown,
        }
    }

    /// Stops watching. Equivalent to dropping the handle, spelled out.
    pub fn stop(self) {}
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
    }
}

/// The background task driving the debounce/cooldown state machine.
pub(crate) struct ReloadCoordinator {
    engine: ConfigEngine,
    change_rx: mpsc::UnboundedReceiver<String>,
    shutdown: broadcast::Receiver<()>,
    batch_delay: Duration,
}

impl ReloadCoordinator {
    pub(crate) fn new(
        engine: ConfigEngine,
        change_rx: mpsc::UnboundedReceiver<String>,
        shutdown: broadcast::Receiver<()>,
    ) -> Self {
        let batch_delay = engine.settings().batch_delay();
        Self {
            engine,
            change_rx,
            shutdown,
            batch_delay,
        }
    }

    pub(crate) async fn run(mut self) {
        let mut pending: HashSet<String> = HashSet::new();
        let timer = sleep(IDLE_PARK);
        tokio::pin!(timer);
        let mut armed = false;

        loop {
            tokio::select! {
                changed = self.change_rx.recv() => {
                    let Some(name) = changed else { break };
                    // Only names that loaded successfully before are
                    // reload candidates; new files wait for a full load.
                    if !self.engine.has_source(&name) {
                        continue;
                    }
                    pending.insert(name);
                    timer.as_mut().reset(Instant::now() + self.batch_delay);
                    armed = true;
                }
                () = timer.as_mut(), if armed => {
                    if let Some(wait) = self.engine.cooldown_remaining() {
                        debug!(wait_ms = wait.as_millis() as u64, "reload in cooldown");
                        timer.as_mut().reset(Instant::now() + wait);
                        continue;
                    }
                    if self.engine.is_loading() {
                        timer.as_mut().reset(Instant::now() + RETRY_DELAY);
                        continue;
                    }
                    let batch: Vec<String> = pending.drain().collect();
                    if batch.is_empty() {
                        armed = false;
                        continue;
                    }
                    if self.engine.try_reload_batch(&batch).await {
                        armed = false;
                    } else {
                        // Lost the claim to a concurrent load pass.
                        pending.extend(batch);
                        timer.as_mut().reset(Instant::now() + RETRY_DELAY);
                    }
                }
                _ = self.shutdown.recv() => break,
            }
        }
        debug!("reload coordinator stopped");
    }
}
