//! Cooperative polling scheduler.

use crate::engine::SyncEngine;
use edusync_channel::RemoteChannel;
use edusync_store::LocalStore;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

struct Shutdown {
    stopped: Mutex<bool>,
    signal: Condvar,
}

/// Drives periodic pulls on a dedicated thread.
///
/// Each tick calls [`SyncEngine::tick`], which pulls when provisioned and
/// otherwise retries boot; errors degrade to status flags and the next tick
/// tries again. The interval comes from configuration, and the thread wakes
/// promptly on [`SyncScheduler::stop`] instead of sleeping it out.
///
/// Focus or visibility regain is not a scheduler concern: feed those events
/// straight into [`SyncEngine::pull_now`] with `force = true`, the same path
/// a tick uses.
pub struct SyncScheduler {
    shutdown: Arc<Shutdown>,
    handle: Option<JoinHandle<()>>,
}

impl SyncScheduler {
    /// Spawns the polling thread at the engine's configured interval.
    pub fn start<C, S>(engine: Arc<SyncEngine<C, S>>) -> Self
    where
        C: RemoteChannel + 'static,
        S: LocalStore + 'static,
    {
        let interval = engine.config().poll_interval;
        Self::start_with_interval(engine, interval)
    }

    /// Spawns the polling thread with an explicit interval.
    pub fn start_with_interval<C, S>(engine: Arc<SyncEngine<C, S>>, interval: Duration) -> Self
    where
        C: RemoteChannel + 'static,
        S: LocalStore + 'static,
    {
        let shutdown = Arc::new(Shutdown {
            stopped: Mutex::new(false),
            signal: Condvar::new(),
        });

        let thread_shutdown = Arc::clone(&shutdown);
        let handle = std::thread::spawn(move || {
            tracing::debug!(interval_ms = interval.as_millis() as u64, "poll loop started");
            loop {
                {
                    let mut stopped = thread_shutdown.stopped.lock();
                    if *stopped {
                        break;
                    }
                    let _ = thread_shutdown.signal.wait_for(&mut stopped, interval);
                    if *stopped {
                        break;
                    }
                }
                engine.tick();
            }
            tracing::debug!("poll loop stopped");
        });

        Self {
            shutdown,
            handle: Some(handle),
        }
    }

    /// Stops the polling thread and waits for it to exit.
    pub fn stop(mut self) {
        self.signal_stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    fn signal_stop(&self) {
        let mut stopped = self.shutdown.stopped.lock();
        *stopped = true;
        self.shutdown.signal.notify_all();
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.signal_stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SyncConfig;
    use edusync_channel::MemoryChannel;
    use edusync_store::MemoryStore;

    fn shared_engine(
        channel: Arc<MemoryChannel>,
        interval: Duration,
    ) -> Arc<SyncEngine<Arc<MemoryChannel>, MemoryStore>> {
        Arc::new(
            SyncEngine::new(
                SyncConfig::new().with_poll_interval(interval),
                channel,
                MemoryStore::new(),
            )
            .unwrap(),
        )
    }

    #[test]
    fn scheduler_ticks_until_stopped() {
        let channel = Arc::new(MemoryChannel::new());
        let engine = shared_engine(Arc::clone(&channel), Duration::from_millis(10));
        engine.bootstrap().unwrap();
        let fetched_before = channel.fetch_count();

        let scheduler = SyncScheduler::start(Arc::clone(&engine));
        std::thread::sleep(Duration::from_millis(100));
        scheduler.stop();

        assert!(channel.fetch_count() > fetched_before);

        let settled = channel.fetch_count();
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(channel.fetch_count(), settled);
    }

    #[test]
    fn stop_is_prompt_even_with_long_interval() {
        let channel = Arc::new(MemoryChannel::new());
        let engine = shared_engine(channel, Duration::from_secs(3600));

        let scheduler = SyncScheduler::start(engine);
        let started = std::time::Instant::now();
        scheduler.stop();
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn scheduler_bootstraps_an_unprovisioned_engine() {
        let channel = Arc::new(MemoryChannel::new());
        let engine = shared_engine(Arc::clone(&channel), Duration::from_millis(10));

        let scheduler = SyncScheduler::start(Arc::clone(&engine));
        std::thread::sleep(Duration::from_millis(100));
        scheduler.stop();

        assert!(engine.channel_id().is_some());
        assert_eq!(channel.create_count(), 1);
    }
}
