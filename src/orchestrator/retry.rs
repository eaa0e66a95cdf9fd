//! Per-call deadlines and bounded retries for agent calls

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::agents::AgentError;
use crate::config::OrchestrationConfig;
use crate::models::FailureCode;

/// How one agent step is attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
    /// Deadline of a single attempt
    pub call_timeout: Duration,
    /// Failure recorded when an attempt runs out of time
    pub timeout_code: FailureCode,
}

impl RetryPolicy {
    #[must_use]
    pub fn from_config(
        config: &OrchestrationConfig,
        call_timeout: Duration,
        timeout_code: FailureCode,
    ) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            backoff_max: Duration::from_millis(config.backoff_max_ms),
            call_timeout,
            timeout_code,
        }
    }

    /// Wait before attempt `attempt + 1`: doubling from the base, capped
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u32.saturating_pow(attempt.saturating_sub(1));
        self.backoff_base.saturating_mul(factor).min(self.backoff_max)
    }
}

/// Final outcome of a step and how many attempts it took
#[derive(Debug)]
pub struct Attempted<T> {
    pub outcome: Result<T, AgentError>,
    pub attempts: u32,
}

/// Run `call` until it succeeds, fails with a non-retryable code, or the
/// attempts run out
pub async fn run_with_retry<T, F, Fut>(step: &'static str, policy: &RetryPolicy, mut call: F) -> Attempted<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AgentError>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        debug!(step, attempt, "Calling agent");

        let outcome = match tokio::time::timeout(policy.call_timeout, call()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(AgentError::new(
                policy.timeout_code,
                format!("no answer within {:?}", policy.call_timeout),
            )),
        };

        match outcome {
            Ok(value) => {
                return Attempted {
                    outcome: Ok(value),
                    attempts: attempt,
                };
            }
            Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                let wait = policy.backoff(attempt);
                warn!(step, attempt, error = %e, wait_ms = wait.as_millis() as u64, "Agent failed; retrying");
                tokio::time::sleep(wait).await;
            }
            Err(e) => {
                warn!(step, attempt, error = %e, "Agent failed");
                return Attempted {
                    outcome: Err(e),
                    attempts: attempt,
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff_base: Duration::from_millis(1),
            backoff_max: Duration::from_millis(4),
            call_timeout: Duration::from_millis(50),
            timeout_code: FailureCode::ProviderUnavailable,
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy {
            backoff_base: Duration::from_millis(200),
            backoff_max: Duration::from_millis(2000),
            ..policy(5)
        };
        assert_eq!(policy.backoff(1), Duration::from_millis(200));
        assert_eq!(policy.backoff(2), Duration::from_millis(400));
        assert_eq!(policy.backoff(4), Duration::from_millis(1600));
        assert_eq!(policy.backoff(5), Duration::from_millis(2000));
        assert_eq!(policy.backoff(40), Duration::from_millis(2000));
    }

    #[tokio::test]
    async fn test_transient_failures_are_retried_until_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let attempted = run_with_retry("test", &policy(3), move || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(AgentError::provider_unavailable("flaky"))
            } else {
                Ok(7)
            }
        })
        .await;
        assert_eq!(attempted.outcome.unwrap(), 7);
        assert_eq!(attempted.attempts, 3);
    }

    #[tokio::test]
    async fn test_retry_bound_is_respected() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let attempted: Attempted<()> = run_with_retry("test", &policy(3), move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AgentError::distance_service_unavailable("down"))
        })
        .await;
        assert_eq!(attempted.attempts, 3);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert!(attempted.outcome.is_err());
    }

    #[tokio::test]
    async fn test_permanent_failures_are_not_retried() {
        let counter = AtomicU32::new(0);
        let calls = &counter;
        let attempted: Attempted<()> = run_with_retry("test", &policy(3), move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(AgentError::route_not_found("nope"))
        })
        .await;
        assert_eq!(attempted.attempts, 1);
        assert_eq!(attempted.outcome.unwrap_err().code, FailureCode::RouteNotFound);
    }

    #[tokio::test]
    async fn test_slow_calls_time_out_with_the_policy_code() {
        let attempted: Attempted<()> = run_with_retry("test", &policy(1), || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;
        assert_eq!(attempted.outcome.unwrap_err().code, FailureCode::ProviderUnavailable);
    }
}
