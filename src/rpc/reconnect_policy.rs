/// The reconnect backoff state machine.
///
/// Pure bookkeeping, same contract as the heartbeat machine: the driver
/// reports closes and opens, the policy answers with delays. The delay
/// doubles per attempt without a cap; the attempt budget is what stops the
/// doubling from running away. Both reset on a successful open.
#[derive(Debug)]
pub struct ReconnectPolicy {
    base_delay: u64,
    delay: u64,
    attempts: u32,
    max_attempts: u32,
    enabled: bool,
    reconnecting: bool,
}

impl ReconnectPolicy {
    pub fn new(base_delay: u64, max_attempts: u32) -> Self {
        Self {
            base_delay,
            delay: base_delay,
            attempts: 0,
            max_attempts,
            enabled: false,
            reconnecting: false,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// An unexpected close happened. Returns the delay before the next
    /// attempt, or `None` when reconnection is disabled or the attempt
    /// budget is spent.
    pub fn on_close(&mut self) -> Option<u64> {
        if !self.enabled || self.attempts >= self.max_attempts {
            return None;
        }
        self.reconnecting = true;
        self.attempts += 1;
        let delay = self.delay;
        self.delay *= 2;
        Some(delay)
    }

    /// A connection opened. Resets the backoff and reports whether this
    /// open concluded a reconnect cycle (so the caller can emit `Reconnect`
    /// rather than `Open`). Any pending reconnect timer should be cancelled
    /// by the driver.
    pub fn on_open(&mut self) -> bool {
        let was_reconnecting = self.reconnecting;
        self.reconnecting = false;
        self.delay = self.base_delay;
        self.attempts = 0;
        was_reconnecting
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn current_delay(&self) -> u64 {
        self.delay
    }
}
