use crate::config::PolitenessConfig;
use std::time::{Duration, Instant};

/// Adaptive inter-request delay toward the crawled host
///
/// The delay starts at the configured minimum. A run of slow responses
/// (slower than the threshold, or server-overload statuses) doubles it up to
/// the ceiling; a run of fast responses halves it back toward the minimum.
#[derive(Debug, Clone)]
pub struct Throttle {
    /// Delay currently enforced between fetches
    pub current_delay: Duration,

    /// Number of fetch slots handed out so far
    pub request_count: u64,

    /// Most recent dispatch slot or response completion, whichever is later
    pub last_request_time: Option<Instant>,

    min_delay: Duration,
    max_delay: Duration,
    slow_threshold: Duration,
    escalate_after: u32,
    deescalate_after: u32,
    slow_streak: u32,
    fast_streak: u32,
}

impl Throttle {
    pub fn new(config: &PolitenessConfig) -> Self {
        let min_delay = Duration::from_millis(config.download_delay_ms);
        Self {
            current_delay: min_delay,
            request_count: 0,
            last_request_time: None,
            min_delay,
            max_delay: Duration::from_millis(config.max_delay_ms),
            slow_threshold: Duration::from_millis(config.slow_response_ms),
            escalate_after: config.escalate_after.max(1),
            deescalate_after: config.deescalate_after.max(1),
            slow_streak: 0,
            fast_streak: 0,
        }
    }

    /// Calculates the time until the next request may start
    ///
    /// Returns None if a request can be made now.
    pub fn time_until_next_request(&self, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let ready_at = last + self.current_delay;
        if ready_at > now {
            Some(ready_at - now)
        } else {
            None
        }
    }

    /// Reserves the next dispatch slot and returns how long to wait for it
    ///
    /// The reservation is recorded immediately, so concurrent callers are
    /// spaced by the current delay even before any of them has slept.
    pub fn reserve_slot(&mut self, now: Instant) -> Duration {
        let wait = self.time_until_next_request(now).unwrap_or(Duration::ZERO);
        self.last_request_time = Some(now + wait);
        self.request_count += 1;
        wait
    }

    /// Records a finished response and adapts the delay
    ///
    /// # Arguments
    ///
    /// * `elapsed` - Time from request start to response
    /// * `overloaded` - The server signalled overload (timeout, 5xx, 429)
    /// * `now` - Completion time
    pub fn record_response(&mut self, elapsed: Duration, overloaded: bool, now: Instant) {
        self.last_request_time = Some(match self.last_request_time {
            Some(last) if last > now => last,
            _ => now,
        });

        if overloaded || elapsed > self.slow_threshold {
            self.fast_streak = 0;
            self.slow_streak += 1;
            if self.slow_streak >= self.escalate_after {
                self.slow_streak = 0;
                self.escalate();
            }
        } else {
            self.slow_streak = 0;
            self.fast_streak += 1;
            if self.fast_streak >= self.deescalate_after {
                self.fast_streak = 0;
                self.deescalate();
            }
        }
    }

    fn escalate(&mut self) {
        let next = std::cmp::max(self.current_delay * 2, Duration::from_millis(1));
        let next = std::cmp::min(next, self.max_delay);
        if next != self.current_delay {
            tracing::info!(
                "Throttle escalated: {:?} -> {:?}",
                self.current_delay,
                next
            );
        }
        self.current_delay = next;
    }

    fn deescalate(&mut self) {
        let next = std::cmp::max(self.current_delay / 2, self.min_delay);
        if next != self.current_delay {
            tracing::debug!(
                "Throttle relaxed: {:?} -> {:?}",
                self.current_delay,
                next
            );
        }
        self.current_delay = next;
    }

    /// Returns true if the delay is above its configured minimum
    pub fn is_escalated(&self) -> bool {
        self.current_delay > self.min_delay
    }
}
