//! Circuit Breaker
//!
//! Threshold breaker: trips after a run of consecutive failures, stays open
//! for a fixed timeout, then lets calls through again to probe the backend.

use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::config::BreakerConfig;
use crate::error::Result;

// == Breaker ==
/// Decides whether a call may proceed and learns from its outcome.
pub trait Breaker: Send + Sync {
    /// Returns false while calls should fail fast.
    fn allow(&self) -> bool;

    fn report_success(&self);

    fn report_failure(&self);
}

// == Breaker State ==
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Calls flow; failures are counted
    Closed,
    /// Calls are rejected until the reset timeout elapses
    Open,
    /// Calls flow; the next outcome decides between Closed and Open
    HalfOpen,
}

impl fmt::Display for BreakerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half-open",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: BreakerState,
    failure_count: u32,
    last_failure: Option<Instant>,
}

// == Circuit Breaker ==
#[derive(Debug)]
pub struct CircuitBreaker {
    inner: Mutex<BreakerInner>,
    failure_threshold: u32,
    reset_timeout: Duration,
}

impl CircuitBreaker {
    /// Builds a closed breaker after validating `config`.
    pub fn new(config: BreakerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            inner: Mutex::new(BreakerInner {
                state: BreakerState::Closed,
                failure_count: 0,
                last_failure: None,
            }),
            failure_threshold: config.failure_threshold,
            reset_timeout: config.reset_timeout,
        })
    }

    pub fn state(&self) -> BreakerState {
        self.inner.lock().state
    }

    /// Consecutive failures counted since the last reset.
    pub fn failure_count(&self) -> u32 {
        self.inner.lock().failure_count
    }
}

impl Breaker for CircuitBreaker {
    fn allow(&self) -> bool {
        let mut inner = self.inner.lock();
        match inner.state {
            BreakerState::Closed | BreakerState::HalfOpen => true,
            BreakerState::Open => {
                let elapsed = inner
                    .last_failure
                    .map_or(Duration::MAX, |at| at.elapsed());
                if elapsed >= self.reset_timeout {
                    inner.state = BreakerState::HalfOpen;
                    info!("circuit breaker half-open, probing backend");
                    true
                } else {
                    false
                }
            }
        }
    }

    fn report_success(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            BreakerState::HalfOpen => {
                inner.state = BreakerState::Closed;
                inner.failure_count = 0;
                info!("circuit breaker closed");
            }
            BreakerState::Closed => inner.failure_count = 0,
            BreakerState::Open => {}
        }
    }

    fn report_failure(&self) {
        let mut inner = self.inner.lock();
        match inner.state {
            BreakerState::Closed => {
                inner.failure_count = inner.failure_count.saturating_add(1);
                if inner.failure_count >= self.failure_threshold {
                    inner.state = BreakerState::Open;
                    inner.last_failure = Some(Instant::now());
                    warn!(
                        failures = inner.failure_count,
                        "circuit breaker tripped open"
                    );
                }
            }
            BreakerState::HalfOpen => {
                inner.state = BreakerState::Open;
                inner.last_failure = Some(Instant::now());
                warn!("probe failed, circuit breaker re-opened");
            }
            BreakerState::Open => {}
        }
    }
}
