//! Pass configuration: fixed and polled waits, candidate bounds, and pause behaviour

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Every wait a form pass performs
///
/// Defaults give client-side rendering and JS handlers of a typical
/// application form time to settle. [`Timing::instant`] disables all of them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Timing {
    /// Fixed delay after navigation before looking at the page
    pub page_settle: Duration,

    /// Upper bound for `document.readyState` to reach `complete`
    pub ready_timeout: Duration,

    /// Upper bound for a matching element to become visible and enabled
    pub element_wait: Duration,

    /// Interval between polls of a polled wait
    pub poll_interval: Duration,

    /// Delay after scrolling an element into view
    pub scroll_settle: Duration,

    /// Delay after writing a value before reading it back
    pub fill_settle: Duration,

    /// Delay between characters when emulating keystrokes
    pub keystroke_delay: Duration,

    /// Upper bound of the random jitter added to each keystroke delay
    pub keystroke_jitter: Duration,

    /// Delay before looking for submit controls
    pub pre_submit_settle: Duration,

    /// Delay after an accepted click before verifying the outcome
    pub verify_delay: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            page_settle: Duration::from_secs(5),
            ready_timeout: Duration::from_secs(10),
            element_wait: Duration::from_secs(3),
            poll_interval: Duration::from_millis(250),
            scroll_settle: Duration::from_secs(1),
            fill_settle: Duration::from_millis(500),
            keystroke_delay: Duration::from_millis(100),
            keystroke_jitter: Duration::from_millis(40),
            pre_submit_settle: Duration::from_secs(3),
            verify_delay: Duration::from_secs(5),
        }
    }
}

impl Timing {
    /// All waits set to zero; polled waits check exactly once
    pub fn instant() -> Self {
        Self {
            page_settle: Duration::ZERO,
            ready_timeout: Duration::ZERO,
            element_wait: Duration::ZERO,
            poll_interval: Duration::ZERO,
            scroll_settle: Duration::ZERO,
            fill_settle: Duration::ZERO,
            keystroke_delay: Duration::ZERO,
            keystroke_jitter: Duration::ZERO,
            pre_submit_settle: Duration::ZERO,
            verify_delay: Duration::ZERO,
        }
    }
}

/// Sleep for `duration`, skipping the syscall for zero
pub fn pause(duration: Duration) {
    if !duration.is_zero() {
        std::thread::sleep(duration);
    }
}

/// Poll `probe` until it yields a value or `timeout` elapses
///
/// The probe always runs at least once, so a zero timeout degenerates to a
/// single check.
pub fn poll_until<T>(timeout: Duration, interval: Duration, mut probe: impl FnMut() -> Option<T>) -> Option<T> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(found) = probe() {
            return Some(found);
        }
        if Instant::now() >= deadline {
            return None;
        }
        pause(interval.max(Duration::from_millis(1)).min(deadline.saturating_duration_since(Instant::now())));
    }
}

/// Configuration for one form-filling pass
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FillerConfig {
    pub timing: Timing,

    /// How many ranked submit candidates are tried before falling back to raw form submission
    pub max_submit_candidates: usize,

    /// Stop before submitting when unfilled fields remain and no values were supplied for them
    pub pause_when_unfilled: bool,
}

impl Default for FillerConfig {
    fn default() -> Self {
        Self { timing: Timing::default(), max_submit_candidates: 5, pause_when_unfilled: false }
    }
}

impl FillerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: replace the timing table
    pub fn timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    /// Builder method: bound the number of submit candidates tried
    pub fn max_submit_candidates(mut self, max: usize) -> Self {
        self.max_submit_candidates = max;
        self
    }

    /// Builder method: stop before submission when residual fields have no values
    pub fn pause_when_unfilled(mut self, pause: bool) -> Self {
        self.pause_when_unfilled = pause;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FillerConfig::default();
        assert_eq!(config.max_submit_candidates, 5);
        assert!(!config.pause_when_unfilled);
        assert_eq!(config.timing.verify_delay, Duration::from_secs(5));
        assert_eq!(config.timing.element_wait, Duration::from_secs(3));
    }

    #[test]
    fn test_config_builder() {
        let config = FillerConfig::new().timing(Timing::instant()).max_submit_candidates(2).pause_when_unfilled(true);
        assert_eq!(config.max_submit_candidates, 2);
        assert!(config.pause_when_unfilled);
        assert!(config.timing.page_settle.is_zero());
    }

    #[test]
    fn test_poll_until_zero_timeout_checks_once() {
        let mut calls = 0;
        let found: Option<()> = poll_until(Duration::ZERO, Duration::ZERO, || {
            calls += 1;
            None
        });
        assert!(found.is_none());
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_poll_until_returns_first_hit() {
        let mut calls = 0;
        let found = poll_until(Duration::from_millis(200), Duration::from_millis(1), || {
            calls += 1;
            (calls == 3).then_some(calls)
        });
        assert_eq!(found, Some(3));
    }
}
