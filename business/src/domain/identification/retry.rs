use std::time::Duration;

use super::errors::FailureReason;

/// Backoff and attempt budget for identification requests.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub base_delay: Duration,
    /// Base delay used instead of `base_delay` after a rate-limited response.
    pub rate_limited_base_delay: Duration,
    pub multiplier: f64,
    pub max_delay: Duration,
    /// Upper bound of the random delay added to every backoff.
    pub jitter: Option<Duration>,
    pub is_retryable: fn(&FailureReason) -> bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            rate_limited_base_delay: Duration::from_secs(5),
            multiplier: 2.0,
            max_delay: Duration::from_secs(30),
            jitter: Some(Duration::from_millis(250)),
            is_retryable: FailureReason::is_retryable_by_default,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    RetryAfter(Duration),
    Stop,
}

/// Stateless retry policy evaluation.
#[derive(Debug, Clone, Default)]
pub struct RetryController {
    policy: RetryPolicy,
}

impl RetryController {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn max_attempts(&self) -> u32 {
        self.policy.max_attempts.max(1)
    }

    /// Decides what happens after `attempt` (1-indexed) failed with `reason`.
    pub fn should_retry(&self, reason: &FailureReason, attempt: u32) -> RetryDecision {
        let jitter_fraction = if self.policy.jitter.is_some() {
            rand::random::<f64>()
        } else {
            0.0
        };
        self.decide(reason, attempt, jitter_fraction)
    }

    /// Deterministic core of [`should_retry`](Self::should_retry);
    /// `jitter_fraction` in [0, 1) scales the configured jitter bound.
    pub fn decide(&self, reason: &FailureReason, attempt: u32, jitter_fraction: f64) -> RetryDecision {
        if matches!(
            reason,
            FailureReason::Cancelled
                | FailureReason::MalformedResponse
                | FailureReason::ServerRejected
                | FailureReason::InvalidImage
        ) {
            return RetryDecision::Stop;
        }
        if !(self.policy.is_retryable)(reason) || attempt >= self.max_attempts() {
            return RetryDecision::Stop;
        }

        RetryDecision::RetryAfter(self.delay_for(reason, attempt, jitter_fraction))
    }

    fn delay_for(&self, reason: &FailureReason, attempt: u32, jitter_fraction: f64) -> Duration {
        let base = match reason {
            FailureReason::RateLimited => self.policy.rate_limited_base_delay,
            _ => self.policy.base_delay,
        };
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let scaled = base.as_secs_f64() * self.policy.multiplier.max(1.0).powi(exponent);

        let jitter = self
            .policy
            .jitter
            .map(|bound| bound.as_secs_f64() * jitter_fraction.clamp(0.0, 1.0))
            .unwrap_or(0.0);

        let ceiling = self.policy.max_delay.as_secs_f64();
        let secs = (scaled + jitter).min(ceiling);
        if secs.is_finite() && secs > 0.0 {
            Duration::from_secs_f64(secs)
        } else if secs.is_finite() {
            Duration::ZERO
        } else {
            self.policy.max_delay
        }
    }
}
