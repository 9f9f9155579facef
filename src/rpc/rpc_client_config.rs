use crate::constants::{
    DEFAULT_GAP_THRESHOLD_MS, DEFAULT_HEARTBEAT_INTERVAL_MS, DEFAULT_MAX_RECONNECT_ATTEMPTS,
    DEFAULT_RECONNECT_DELAY_MS,
};

/// Recognized client options. All durations are in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Delay between arming the heartbeat and sending the probe. 0 disables
    /// heartbeats entirely.
    pub heartbeat_interval: u64,

    /// How long after a probe (or the latest inbound traffic) the peer is
    /// considered dead. 0 means "twice the interval".
    pub heartbeat_timeout: u64,

    /// Slack the watchdog tolerates before declaring a timeout; anything
    /// larger means a fresher deadline was set in the interim and the
    /// watchdog reschedules itself instead of firing falsely.
    pub gap_threshold: u64,

    /// Base delay before the first reconnect attempt; doubles per attempt.
    pub reconnect_delay: u64,

    /// Attempt budget per disconnect episode.
    pub max_reconnect_attempts: u32,

    /// Whether unexpected closes trigger reconnection at all.
    pub reconnect: bool,

    /// Endpoint reconnects return to. When unset, pinned to the first URL
    /// ever connected to.
    pub reconnect_url: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL_MS,
            heartbeat_timeout: DEFAULT_HEARTBEAT_INTERVAL_MS * 2,
            gap_threshold: DEFAULT_GAP_THRESHOLD_MS,
            reconnect_delay: DEFAULT_RECONNECT_DELAY_MS,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            reconnect: false,
            reconnect_url: None,
        }
    }
}

impl ClientConfig {
    /// The effective heartbeat timeout: the configured value, or twice the
    /// interval when left at 0.
    pub fn effective_heartbeat_timeout(&self) -> u64 {
        if self.heartbeat_timeout == 0 {
            self.heartbeat_interval * 2
        } else {
            self.heartbeat_timeout
        }
    }
}
