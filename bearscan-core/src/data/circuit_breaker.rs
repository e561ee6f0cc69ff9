//! Circuit breaker shared by every request to a provider.
//!
//! Opens immediately on an IP ban (HTTP 403) or after `failure_threshold`
//! consecutive failures, then refuses requests until `cooldown` elapses.
//! A scan over a large universe stops hammering Yahoo after the first few
//! failures instead of timing out on every remaining ticker.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

#[derive(Debug)]
struct Inner {
    opened_at: Option<Instant>,
    consecutive_failures: u32,
}

#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<Inner>,
    cooldown: Duration,
    failure_threshold: u32,
}

impl CircuitBreaker {
    pub fn new(cooldown: Duration, failure_threshold: u32) -> Self {
        Self {
            inner: Mutex::new(Inner {
                opened_at: None,
                consecutive_failures: 0,
            }),
            cooldown,
            failure_threshold: failure_threshold.max(1),
        }
    }

    /// 15-minute cooldown, opens after 5 consecutive failures.
    pub fn default_provider() -> Self {
        Self::new(Duration::from_secs(15 * 60), 5)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Whether a request may be sent now. Closes the breaker once the
    /// cooldown has passed.
    pub fn is_allowed(&self) -> bool {
        let mut inner = self.lock();
        match inner.opened_at {
            None => true,
            Some(at) if at.elapsed() >= self.cooldown => {
                inner.opened_at = None;
                inner.consecutive_failures = 0;
                tracing::info!("circuit breaker closed after cooldown");
                true
            }
            Some(_) => false,
        }
    }

    pub fn record_success(&self) {
        self.lock().consecutive_failures = 0;
    }

    pub fn record_failure(&self) {
        let mut inner = self.lock();
        inner.consecutive_failures += 1;
        if inner.consecutive_failures >= self.failure_threshold && inner.opened_at.is_none() {
            inner.opened_at = Some(Instant::now());
            tracing::warn!(
                failures = inner.consecutive_failures,
                "circuit breaker opened"
            );
        }
    }

    /// Open immediately, e.g. on HTTP 403.
    pub fn trip(&self) {
        let mut inner = self.lock();
        if inner.opened_at.is_none() {
            tracing::warn!("circuit breaker tripped");
        }
        inner.opened_at = Some(Instant::now());
    }

    pub fn is_open(&self) -> bool {
        !self.is_allowed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_closed() {
        let cb = CircuitBreaker::default_provider();
        assert!(cb.is_allowed());
        assert!(!cb.is_open());
    }

    #[test]
    fn opens_after_threshold() {
        let cb = CircuitBreaker::new(Duration::from_secs(60), 3);
        cb.record_failure();
        cb.record_failure();
        assert!(cb.is_allowed());
        cb.record_failure();
        assert!(!cb.is_allowed());
    }

    #[test]
    fn success_resets_failure_count() {
        let cb = CircuitBreaker::new(Duration::from_secs(60), 2);
        cb.record_failure();
        cb.record_success();
        cb.record_failure();
        assert!(cb.is_allowed());
    }

    #[test]
    fn trip_opens_immediately() {
        let cb = CircuitBreaker::new(Duration::from_secs(60), 10);
        cb.trip();
        assert!(cb.is_open());
    }

    #[test]
    fn closes_after_cooldown() {
        let cb = CircuitBreaker::new(Duration::from_millis(0), 1);
        cb.record_failure();
        assert!(cb.is_allowed());
    }
}
