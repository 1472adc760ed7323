//! Rate limiter for WebSocket message handling.
//!
//! Each socket gets a `MessageLimiter` combining a short burst window with a
//! longer sustained window, both sliding.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Sliding window over recent message timestamps
#[derive(Debug)]
struct SlidingWindow {
    timestamps: VecDeque<Instant>,
    max_requests: usize,
    window: Duration,
}

impl SlidingWindow {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(max_requests),
            max_requests,
            window,
        }
    }

    fn prune(&mut self, now: Instant) {
        while let Some(ts) = self.timestamps.front() {
            if now.duration_since(*ts) > self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }

    fn is_full(&self) -> bool {
        self.timestamps.len() >= self.max_requests
    }
}

/// Which window refused a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitExceeded {
    Burst,
    Sustained,
}

impl LimitExceeded {
    /// Text sent back to the client
    pub fn message(self) -> &'static str {
        match self {
            Self::Burst => "Rate limit exceeded. Please slow down.",
            Self::Sustained => "Too many messages. Please wait before sending more.",
        }
    }

    /// Metric label
    pub fn label(self) -> &'static str {
        match self {
            Self::Burst => "burst",
            Self::Sustained => "sustained",
        }
    }
}

/// Per-socket message limiter
#[derive(Debug)]
pub struct MessageLimiter {
    burst: SlidingWindow,
    sustained: SlidingWindow,
}

impl Default for MessageLimiter {
    /// 10 messages per second, 100 per minute
    fn default() -> Self {
        Self::new(
            (10, Duration::from_secs(1)),
            (100, Duration::from_secs(60)),
        )
    }
}

impl MessageLimiter {
    /// Create a limiter from `(max_requests, window)` pairs
    ///
    /// # Example
    ///
    /// ```
    /// use cl_server::api::rate_limiter::{LimitExceeded, MessageLimiter};
    /// use std::time::Duration;
    ///
    /// let mut limiter = MessageLimiter::new(
    ///     (2, Duration::from_secs(1)),
    ///     (5, Duration::from_secs(60)),
    /// );
    /// assert!(limiter.check().is_ok());
    /// assert!(limiter.check().is_ok());
    /// assert_eq!(limiter.check(), Err(LimitExceeded::Burst));
    /// ```
    pub fn new(burst: (usize, Duration), sustained: (usize, Duration)) -> Self {
        Self {
            burst: SlidingWindow::new(burst.0, burst.1),
            sustained: SlidingWindow::new(sustained.0, sustained.1),
        }
    }

    /// Record a message if both windows have room.
    ///
    /// A refused message is not recorded.
    pub fn check(&mut self) -> Result<(), LimitExceeded> {
        let now = Instant::now();
        self.burst.prune(now);
        self.sustained.prune(now);

        if self.burst.is_full() {
            return Err(LimitExceeded::Burst);
        }
        if self.sustained.is_full() {
            return Err(LimitExceeded::Sustained);
        }

        self.burst.timestamps.push_back(now);
        self.sustained.timestamps.push_back(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_default_burst() {
        let mut limiter = MessageLimiter::default();
        for _ in 0..10 {
            assert!(limiter.check().is_ok());
        }
        assert_eq!(limiter.check(), Err(LimitExceeded::Burst));
    }

    #[test]
    fn test_sustained_window() {
        let mut limiter = MessageLimiter::new(
            (2, Duration::from_millis(50)),
            (3, Duration::from_secs(60)),
        );

        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_ok());
        thread::sleep(Duration::from_millis(80));

        // Burst window has drained, sustained has one slot left
        assert!(limiter.check().is_ok());
        assert_eq!(limiter.check(), Err(LimitExceeded::Sustained));
    }

    #[test]
    fn test_window_expiry() {
        let mut limiter = MessageLimiter::new(
            (2, Duration::from_millis(100)),
            (100, Duration::from_secs(60)),
        );

        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_ok());
        assert!(limiter.check().is_err());

        thread::sleep(Duration::from_millis(150));
        assert!(limiter.check().is_ok(), "Should allow after window expires");
    }

    #[test]
    fn test_refused_messages_not_counted() {
        let mut limiter = MessageLimiter::new(
            (1, Duration::from_secs(60)),
            (2, Duration::from_secs(60)),
        );
        assert!(limiter.check().is_ok());
        for _ in 0..5 {
            assert_eq!(limiter.check(), Err(LimitExceeded::Burst));
        }
        assert_eq!(limiter.sustained.timestamps.len(), 1);
    }
}
