//! Configuration for the sync engine.

use edusync_channel::ChannelId;
use std::time::Duration;

/// Default interval between automatic pulls.
///
/// Deployments tune this anywhere from a few seconds (near-real-time
/// classroom use) to minutes (battery-friendly background sync).
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Configuration for a sync engine instance.
///
/// One engine instance per running client; there is no ambient global
/// configuration. A persisted channel id in the local store takes precedence
/// over [`SyncConfig::channel_id`], which only seeds first-run devices that
/// should join an existing replica group.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Channel to join when the local store has none persisted yet.
    pub channel_id: Option<ChannelId>,
    /// Interval between automatic pulls.
    pub poll_interval: Duration,
}

impl SyncConfig {
    /// Creates a configuration with the default poll interval and no seed
    /// channel.
    pub fn new() -> Self {
        Self {
            channel_id: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Seeds the channel id used when none is persisted locally.
    pub fn with_channel_id(mut self, id: ChannelId) -> Self {
        self.channel_id = Some(id);
        self
    }

    /// Sets the automatic pull interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_chain() {
        let config = SyncConfig::new()
            .with_channel_id(ChannelId::new("ch1"))
            .with_poll_interval(Duration::from_secs(120));

        assert_eq!(config.channel_id, Some(ChannelId::new("ch1")));
        assert_eq!(config.poll_interval, Duration::from_secs(120));
    }

    #[test]
    fn defaults() {
        let config = SyncConfig::default();
        assert_eq!(config.channel_id, None);
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
    }
}
