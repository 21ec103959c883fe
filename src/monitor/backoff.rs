use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What the policy does once consecutive failures exceed the retry cap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EscalationPolicy {
    /// Stop issuing restarts; keep probing so recovery is still observed
    #[default]
    #[serde(rename = "observe")]
    ObserveOnly,

    /// Reset the failure counter and keep restarting
    #[serde(rename = "continue")]
    ContinueRestarting,
}

/// What the caller should do after an unhealthy observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// Restart the service, then honor `wait` before the next probe
    Restart { wait: Duration },
    /// Retry budget exhausted; manual intervention required
    Escalate,
}

/// Retry state owned by the monitor loop
///
/// `consecutive_failures` counts unhealthy observations since the last
/// healthy one; `current_backoff` is the wait the next failure will impose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryState {
    pub consecutive_failures: u32,
    pub current_backoff: Duration,
}

/// Backoff policy: maps consecutive probe failures to the wait imposed
/// before the next probe
///
/// Exponential growth prevents restart storms against a service that is
/// failing to come up; reset-on-success ensures a single blip does not
/// permanently inflate the wait.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Wait imposed after the first failure
    pub initial_backoff: Duration,
    /// Consecutive failures tolerated before escalating
    pub max_retries: u32,
    /// Upper bound on the doubling backoff; None leaves growth unbounded
    pub max_backoff: Option<Duration>,
    /// Behavior once the retry budget is exhausted
    pub on_exhausted: EscalationPolicy,
}

impl BackoffPolicy {
    pub fn new(initial_backoff: Duration, max_retries: u32) -> Self {
        Self {
            initial_backoff,
            max_retries,
            max_backoff: Some(Duration::from_secs(60)),
            on_exhausted: EscalationPolicy::default(),
        }
    }

    /// Create a policy from configuration values
    pub fn from_config(
        initial_backoff: Duration,
        max_retries: u32,
        max_backoff: Option<Duration>,
        on_exhausted: EscalationPolicy,
    ) -> Self {
        Self {
            initial_backoff,
            max_retries,
            max_backoff,
            on_exhausted,
        }
    }

    /// Fresh retry state for this policy
    pub fn initial_state(&self) -> RetryState {
        RetryState {
            consecutive_failures: 0,
            current_backoff: self.initial_backoff,
        }
    }

    /// Healthy observation: reset the counter and the backoff
    pub fn on_success(&self, state: &mut RetryState) {
        state.consecutive_failures = 0;
        state.current_backoff = self.initial_backoff;
    }

    /// Unhealthy observation
    ///
    /// Under the cap: returns the wait to honor and doubles the stored
    /// backoff (clamped to `max_backoff` when one is set). Past the cap:
    /// returns `Escalate`; under `ContinueRestarting` the failure counter
    /// resets so restarts resume on the next failure (the backoff keeps its
    /// grown value until a healthy observation resets it).
    pub fn on_failure(&self, state: &mut RetryState) -> FailureAction {
        state.consecutive_failures += 1;

        if state.consecutive_failures > self.max_retries {
            if self.on_exhausted == EscalationPolicy::ContinueRestarting {
                state.consecutive_failures = 0;
            }
            return FailureAction::Escalate;
        }

        let wait = state.current_backoff;
        let doubled = wait.saturating_mul(2);
        state.current_backoff = match self.max_backoff {
            Some(cap) => doubled.min(cap),
            None => doubled,
        };

        FailureAction::Restart { wait }
    }
}
