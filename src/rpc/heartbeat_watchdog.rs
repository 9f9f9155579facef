/// Outcome of a watchdog check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogVerdict {
    /// A fresher deadline was set in the interim (inbound traffic, or the
    /// timer fired late); re-check after exactly this many milliseconds.
    Reschedule(u64),

    /// No traffic arrived in time. The peer is considered dead.
    TimedOut,

    /// The watchdog was disarmed while the timer was in flight. Stale
    /// firings must be ignored.
    Cancelled,
}

/// The heartbeat liveness state machine.
///
/// This is pure bookkeeping: it never sleeps and never sends. A driver arms
/// it, sleeps for the returned durations, and reports back with the current
/// time; the machine answers with what to do next. That keeps the
/// gap-correction logic (which exists precisely because timers fire late)
/// deterministic and testable without a clock.
///
/// States: Idle → Scheduled (probe pending) → WaitingForTimeout → Idle, or
/// → TimedOut.
#[derive(Debug)]
pub struct HeartbeatWatchdog {
    interval: u64,
    timeout: u64,
    gap_threshold: u64,
    next_deadline: u64,
    probe_scheduled: bool,
    watchdog_armed: bool,
}

impl HeartbeatWatchdog {
    pub fn new(interval: u64, timeout: u64, gap_threshold: u64) -> Self {
        Self {
            interval,
            timeout,
            gap_threshold,
            next_deadline: 0,
            probe_scheduled: false,
            watchdog_armed: false,
        }
    }

    /// Arms the probe timer. Returns the delay until the probe should be
    /// sent, or `None` when heartbeats are disabled or a probe is already
    /// scheduled. A pending watchdog is cancelled either way.
    pub fn arm(&mut self) -> Option<u64> {
        if self.interval == 0 {
            return None;
        }
        self.watchdog_armed = false;
        if self.probe_scheduled {
            return None;
        }
        self.probe_scheduled = true;
        Some(self.interval)
    }

    /// The probe timer fired: the caller sends the probe frame now. Records
    /// the new liveness deadline and arms the watchdog; returns the delay
    /// until the watchdog check. A stale firing (the probe was cancelled
    /// while the timer was in flight) returns `None` and changes nothing.
    pub fn probe_due(&mut self, now: u64) -> Option<u64> {
        if !self.probe_scheduled {
            return None;
        }
        self.probe_scheduled = false;
        self.next_deadline = now + self.timeout;
        self.watchdog_armed = true;
        Some(self.timeout)
    }

    /// The watchdog timer fired.
    pub fn check(&mut self, now: u64) -> WatchdogVerdict {
        if !self.watchdog_armed {
            return WatchdogVerdict::Cancelled;
        }
        let gap = self.next_deadline.saturating_sub(now);
        if gap > self.gap_threshold {
            WatchdogVerdict::Reschedule(gap)
        } else {
            self.watchdog_armed = false;
            WatchdogVerdict::TimedOut
        }
    }

    /// Any inbound message proves liveness and extends the deadline; not
    /// only heartbeat replies count.
    pub fn observe_traffic(&mut self, now: u64) {
        if self.timeout > 0 {
            self.next_deadline = now + self.timeout;
        }
    }

    /// Disarms both timers. In-flight timer callbacks become stale and are
    /// answered with `Cancelled`.
    pub fn cancel(&mut self) {
        self.probe_scheduled = false;
        self.watchdog_armed = false;
    }

    pub fn is_probe_scheduled(&self) -> bool {
        self.probe_scheduled
    }

    pub fn is_watchdog_armed(&self) -> bool {
        self.watchdog_armed
    }
}
