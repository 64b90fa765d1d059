use std::time::Duration;

/// Retry schedule for failed requests.
///
/// Delays grow by exponentiation: starting at `initial` seconds, each delay
/// is the previous one raised to `exponent`, capped at `max_delay`. With the
/// defaults that is 2s, 4s, 16s, 256s.
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub exponent: f64,
    /// Total attempts including the first one.
    pub max_attempts: u32,
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(2),
            exponent: 2.0,
            max_attempts: 5,
            max_delay: Duration::from_secs(300),
        }
    }
}

/// Why an attempt failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Status(u16),
    /// Timeout, refused connection, reset, or a body that could not be read.
    Network(String),
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Status(code) => write!(f, "HTTP {}", code),
            Self::Network(msg) => write!(f, "network error: {}", msg),
        }
    }
}

/// All attempts allowed by the policy have failed.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("retries exhausted after {attempts} attempts (last failure: {last})")]
pub struct BackoffExhausted {
    pub attempts: u32,
    pub last: FailureReason,
}

/// Per-request retry state. Create one per logical request.
#[derive(Debug)]
pub struct Backoff {
    policy: BackoffPolicy,
    failures: u32,
    next_delay: Duration,
}

impl Backoff {
    pub fn new(policy: BackoffPolicy) -> Self {
        let next_delay = policy.initial.min(policy.max_delay);
        Self {
            policy,
            failures: 0,
            next_delay,
        }
    }

    /// Failures recorded so far.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Record a failed attempt.
    ///
    /// Returns the delay to wait before the next attempt, or
    /// [`BackoffExhausted`] when this failure used up the last attempt.
    pub fn on_failure(&mut self, reason: FailureReason) -> Result<Duration, BackoffExhausted> {
        self.failures += 1;
        if self.failures >= self.policy.max_attempts {
            return Err(BackoffExhausted {
                attempts: self.failures,
                last: reason,
            });
        }

        let delay = self.next_delay;
        let current = delay.as_secs_f64();
        let grown = current.powf(self.policy.exponent).max(current);
        self.next_delay = Duration::try_from_secs_f64(grown)
            .unwrap_or(self.policy.max_delay)
            .min(self.policy.max_delay);
        Ok(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(attempts: u32) -> BackoffPolicy {
        BackoffPolicy {
            max_attempts: attempts,
            ..Default::default()
        }
    }

    #[test]
    fn delays_grow_by_exponent_and_cap() {
        let mut backoff = Backoff::new(BackoffPolicy {
            max_attempts: 10,
            ..Default::default()
        });
        let delays: Vec<u64> = (0..6)
            .map(|_| backoff.on_failure(FailureReason::Status(503)).unwrap().as_secs())
            .collect();
        assert_eq!(delays, vec![2, 4, 16, 256, 300, 300]);
    }

    #[test]
    fn nth_failure_is_exhausted() {
        let mut backoff = Backoff::new(policy(5));
        for _ in 0..4 {
            assert!(backoff.on_failure(FailureReason::Status(500)).is_ok());
        }
        let err = backoff
            .on_failure(FailureReason::Network("connection reset".into()))
            .unwrap_err();
        assert_eq!(err.attempts, 5);
        assert_eq!(err.last, FailureReason::Network("connection reset".into()));
        assert_eq!(backoff.failures(), 5);
    }

    #[test]
    fn single_attempt_policy_never_retries() {
        let mut backoff = Backoff::new(policy(1));
        assert!(backoff.on_failure(FailureReason::Status(500)).is_err());
    }

    #[test]
    fn sub_second_initial_delay_does_not_shrink() {
        let mut backoff = Backoff::new(BackoffPolicy {
            initial: Duration::from_millis(10),
            exponent: 2.0,
            max_attempts: 4,
            max_delay: Duration::from_secs(1),
        });
        let first = backoff.on_failure(FailureReason::Status(502)).unwrap();
        let second = backoff.on_failure(FailureReason::Status(502)).unwrap();
        assert_eq!(first, Duration::from_millis(10));
        assert!(second >= first);
    }

    #[test]
    fn reason_display() {
        assert_eq!(FailureReason::Status(429).to_string(), "HTTP 429");
        assert!(FailureReason::Network("timed out".into()).to_string().contains("timed out"));
    }
}
