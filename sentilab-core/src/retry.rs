//! Backoff schedule, cooperative cancellation, and the sleep seam.
//!
//! A long backfill should survive transient outages, but a caller must always
//! be able to stop it. Every blocking wait in the fetch path goes through a
//! [`Sleeper`] that watches a [`CancelToken`].

use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Shared cancellation flag. Cloning shares the flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap an existing flag (e.g. one flipped by a signal handler or UI thread).
    pub fn from_flag(flag: Arc<AtomicBool>) -> Self {
        Self { flag }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Returned by a [`Sleeper`] when the wait was cut short by cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interrupted;

/// Blocking wait that honours cancellation.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration, cancel: &CancelToken) -> Result<(), Interrupted>;
}

/// Real sleeper: sleeps in short slices and re-checks the token between them.
#[derive(Debug, Clone, Copy)]
pub struct ThreadSleeper {
    slice: Duration,
}

impl ThreadSleeper {
    pub fn new(slice: Duration) -> Self {
        Self { slice }
    }
}

impl Default for ThreadSleeper {
    fn default() -> Self {
        Self::new(Duration::from_millis(250))
    }
}

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration, cancel: &CancelToken) -> Result<(), Interrupted> {
        let mut remaining = duration;
        while !remaining.is_zero() {
            if cancel.is_cancelled() {
                return Err(Interrupted);
            }
            let step = remaining.min(self.slice);
            std::thread::sleep(step);
            remaining = remaining.saturating_sub(step);
        }
        if cancel.is_cancelled() {
            return Err(Interrupted);
        }
        Ok(())
    }
}

/// Retry schedule for transient fetch failures.
///
/// The delay before retry `n` (1-based) is
/// `min(base_delay * multiplier^(n-1), max_delay)`, scaled down by a random
/// factor in `[1 - jitter, 1]` when `jitter > 0`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    pub base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    /// Total attempts including the first; `None` retries until cancelled.
    pub max_attempts: Option<u32>,
    pub jitter: f64,
}

impl RetryPolicy {
    /// Constant delay between attempts, never giving up on its own.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            base_delay: delay,
            multiplier: 1.0,
            max_delay: delay,
            max_attempts: None,
            jitter: 0.0,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Whether another attempt is allowed after `attempts_made` attempts.
    pub fn allows_attempt(&self, attempts_made: u32) -> bool {
        self.max_attempts.map_or(true, |max| attempts_made < max)
    }

    /// Un-jittered delay before retry number `retry` (1-based).
    pub fn nominal_delay(&self, retry: u32) -> Duration {
        let exp = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
        let factor = self.multiplier.max(1.0).powi(exp);
        let secs = self.base_delay.as_secs_f64() * factor;
        let capped = secs.min(self.max_delay.as_secs_f64());
        if capped.is_finite() && capped >= 0.0 {
            Duration::from_secs_f64(capped)
        } else {
            self.max_delay
        }
    }

    /// Delay before retry number `retry`, with jitter applied.
    pub fn delay(&self, retry: u32) -> Duration {
        let nominal = self.nominal_delay(retry);
        let jitter = self.jitter.clamp(0.0, 1.0);
        if jitter == 0.0 {
            return nominal;
        }
        let scale = rand::thread_rng().gen_range((1.0 - jitter)..=1.0);
        nominal.mul_f64(scale)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(60),
            multiplier: 2.0,
            max_delay: Duration::from_secs(15 * 60),
            max_attempts: Some(8),
            jitter: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_policy_is_constant_and_unbounded() {
        let p = RetryPolicy::fixed(Duration::from_secs(60));
        assert_eq!(p.delay(1), Duration::from_secs(60));
        assert_eq!(p.delay(50), Duration::from_secs(60));
        assert!(p.allows_attempt(1_000_000));
    }

    #[test]
    fn exponential_policy_caps_at_max_delay() {
        let p = RetryPolicy::default();
        assert_eq!(p.nominal_delay(1), Duration::from_secs(60));
        assert_eq!(p.nominal_delay(2), Duration::from_secs(120));
        assert_eq!(p.nominal_delay(3), Duration::from_secs(240));
        assert_eq!(p.nominal_delay(10), Duration::from_secs(900));
        assert_eq!(p.nominal_delay(u32::MAX), Duration::from_secs(900));
    }

    #[test]
    fn max_attempts_bounds_the_loop() {
        let p = RetryPolicy::fixed(Duration::ZERO).with_max_attempts(3);
        assert!(p.allows_attempt(0));
        assert!(p.allows_attempt(2));
        assert!(!p.allows_attempt(3));
    }

    #[test]
    fn jitter_never_exceeds_nominal() {
        let p = RetryPolicy {
            jitter: 0.5,
            ..RetryPolicy::default()
        };
        for retry in 1..6 {
            let d = p.delay(retry);
            assert!(d <= p.nominal_delay(retry));
            assert!(d >= p.nominal_delay(retry).mul_f64(0.5));
        }
    }

    #[test]
    fn cancel_token_is_shared_between_clones() {
        let a = CancelToken::new();
        let b = a.clone();
        assert!(!b.is_cancelled());
        a.cancel();
        assert!(b.is_cancelled());
    }

    #[test]
    fn thread_sleeper_returns_early_when_cancelled() {
        let token = CancelToken::new();
        token.cancel();
        let sleeper = ThreadSleeper::new(Duration::from_millis(5));
        let started = std::time::Instant::now();
        assert_eq!(sleeper.sleep(Duration::from_secs(30), &token), Err(Interrupted));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn thread_sleeper_completes_short_waits() {
        let sleeper = ThreadSleeper::new(Duration::from_millis(5));
        assert_eq!(sleeper.sleep(Duration::from_millis(12), &CancelToken::new()), Ok(()));
    }
}
