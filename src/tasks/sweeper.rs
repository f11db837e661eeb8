//! Cache Sweeper Task
//!
//! Background task that periodically evicts expired cache entries.

use std::sync::{mpsc, Weak};
use std::thread;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::cache::CacheShared;

// == Sweeper Handle ==
/// Owned handle to a running sweeper.
///
/// The sweeper stops when [`stop`](Self::stop) is called, when the handle is
/// dropped, or when the cache it watches has been dropped.
#[derive(Debug)]
pub struct SweeperHandle {
    shutdown: Shutdown,
    task: Task,
}

#[derive(Debug)]
enum Shutdown {
    Tokio(oneshot::Sender<()>),
    Thread(mpsc::Sender<()>),
}

#[derive(Debug)]
enum Task {
    Tokio(JoinHandle<()>),
    Thread(thread::JoinHandle<()>),
}

impl SweeperHandle {
    /// Spawns the sweeper on the current Tokio runtime, or on a dedicated
    /// thread when called outside one.
    pub(crate) fn spawn(cache: Weak<CacheShared>, interval: Duration) -> Self {
        match Handle::try_current() {
            Ok(runtime) => {
                let (shutdown, shutdown_rx) = oneshot::channel();
                let task = spawn_sweeper(&runtime, cache, interval, shutdown_rx);
                Self {
                    shutdown: Shutdown::Tokio(shutdown),
                    task: Task::Tokio(task),
                }
            }
            Err(_) => {
                let (shutdown, shutdown_rx) = mpsc::channel();
                let task = spawn_sweeper_thread(cache, interval, shutdown_rx);
                Self {
                    shutdown: Shutdown::Thread(shutdown),
                    task: Task::Thread(task),
                }
            }
        }
    }

    /// Signals the sweeper to exit before its next pass.
    pub fn stop(self) {
        // The sweeper may already be gone if the cache was dropped
        match self.shutdown {
            Shutdown::Tokio(tx) => {
                let _ = tx.send(());
            }
            Shutdown::Thread(tx) => {
                let _ = tx.send(());
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        match &self.task {
            Task::Tokio(task) => task.is_finished(),
            Task::Thread(task) => task.is_finished(),
        }
    }
}

/// Runs one sweep pass. Returns false once the cache no longer exists.
fn sweep_tick(cache: &Weak<CacheShared>) -> bool {
    let Some(cache) = cache.upgrade() else {
        debug!("Cache dropped, sweeper exiting");
        return false;
    };

    let removed = cache.sweep();
    drop(cache);

    if removed > 0 {
        info!("Cache sweep: removed {} expired entries", removed);
    } else {
        debug!("Cache sweep: no expired entries found");
    }
    true
}

/// Spawns the sweep loop on a Tokio runtime.
///
/// Every `interval` the loop upgrades its weak reference to the cache and runs
/// one scan-then-delete pass. It exits when the shutdown channel fires or is
/// dropped, or when the cache no longer exists.
fn spawn_sweeper(
    runtime: &Handle,
    cache: Weak<CacheShared>,
    interval: Duration,
    mut shutdown: oneshot::Receiver<()>,
) -> JoinHandle<()> {
    runtime.spawn(async move {
        info!("Starting cache sweeper with interval of {:?}", interval);

        let mut ticker = interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("Cache sweeper stopped");
                    break;
                }
                _ = ticker.tick() => {}
            }

            if !sweep_tick(&cache) {
                break;
            }
        }
    })
}

/// Thread-based sweep loop with the same exit conditions as [`spawn_sweeper`].
fn spawn_sweeper_thread(
    cache: Weak<CacheShared>,
    interval: Duration,
    shutdown: mpsc::Receiver<()>,
) -> thread::JoinHandle<()> {
    warn!("No Tokio runtime, running cache sweeper on a dedicated thread");

    thread::spawn(move || {
        info!("Starting cache sweeper thread with interval of {:?}", interval);

        loop {
            match shutdown.recv_timeout(interval) {
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    if !sweep_tick(&cache) {
                        break;
                    }
                }
                // Explicit stop or handle dropped
                Ok(()) | Err(mpsc::RecvTimeoutError::Disconnected) => {
                    info!("Cache sweeper stopped");
                    break;
                }
            }
        }
    })
}
