use std::time::Duration;

/// Exponential back-off with a configurable initial delay, growth factor and
/// cap. Shared by the supervisor's restart policy (§4.6) and the remote
/// config client's transport retry loop (§4.5) — same primitive, two
/// configurations.
#[derive(Clone, Debug, PartialEq)]
pub struct ExponentialBackoff {
    initial: Duration,
    factor: u32,
    cap: Duration,
    attempt: u32,
}

impl ExponentialBackoff {
    pub fn new(initial: Duration, factor: u32, cap: Duration) -> Self {
        Self {
            initial,
            factor,
            cap,
            attempt: 0,
        }
    }

    /// Returns the delay for the current attempt and advances the counter.
    pub fn next_delay(&mut self) -> Duration {
        let multiplier = self.factor.saturating_pow(self.attempt);
        let delay = self.initial.saturating_mul(multiplier.max(1));
        self.attempt = self.attempt.saturating_add(1);
        delay.min(self.cap)
    }

    /// Resets the attempt counter, e.g. after a sustained healthy window.
    pub fn reset(&mut self) {
        self.attempt = 0;
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }
}
