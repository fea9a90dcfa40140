//! Reconnect scheduling: exponential backoff with jitter, a retry cap,
//! and reset-on-success.

use std::time::Duration;

use rand::Rng;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SupervisorState {
    Idle,
    Running,
    BackingOff,
    Terminated,
}

#[derive(Debug)]
pub struct ReconnectSupervisor {
    base: Duration,
    cap: Duration,
    max_retries: u32,
    attempts: u32,
    state: SupervisorState,
}

impl ReconnectSupervisor {
    pub fn new(base: Duration, cap: Duration, max_retries: u32) -> Self {
        Self {
            base,
            cap,
            max_retries,
            attempts: 0,
            state: SupervisorState::Idle,
        }
    }

    pub fn start(&mut self) {
        if self.state == SupervisorState::Idle {
            self.state = SupervisorState::Running;
        }
    }

    /// Register a failed attempt. Returns the delay to sleep before the
    /// next attempt, or `None` once the retry cap is exceeded (the
    /// supervisor is then terminated for good).
    pub fn on_failure(&mut self) -> Option<Duration> {
        if self.state == SupervisorState::Terminated {
            return None;
        }
        self.attempts += 1;
        if self.attempts > self.max_retries {
            self.state = SupervisorState::Terminated;
            return None;
        }
        self.state = SupervisorState::BackingOff;
        Some(self.backoff_delay(self.attempts))
    }

    /// Called on every successful connect; the attempt counter returns
    /// to zero.
    pub fn reset(&mut self) {
        self.attempts = 0;
        if self.state != SupervisorState::Terminated {
            self.state = SupervisorState::Running;
        }
    }

    /// Cancel any further attempts.
    pub fn stop(&mut self) {
        self.state = SupervisorState::Terminated;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn state(&self) -> SupervisorState {
        self.state
    }

    /// Delay for 1-based attempt `k`: `min(base * 2^(k-1), cap)` scaled
    /// by a uniform factor in `[0.5, 1.5)`.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(31);
        let base_ms = self.base.as_millis() as u64;
        let capped_ms = base_ms
            .saturating_mul(1u64 << exp)
            .min(self.cap.as_millis() as u64);
        let jitter: f64 = rand::rng().random_range(0.5..1.5);
        Duration::from_millis((capped_ms as f64 * jitter) as u64)
    }
}
