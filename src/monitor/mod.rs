// Monitor module - the health-check / recovery loop

pub mod backoff;

use crate::error::Result;
use crate::exit::ExitFlag;
use crate::health::{HealthState, Prober};
use crate::monitor::backoff::{BackoffPolicy, EscalationPolicy, FailureAction, RetryState};
use crate::process::ProcessController;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Monitor loop configuration
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Interval between health probes
    pub check_interval: Duration,
    /// Granularity at which sleeps poll the exit flag
    pub poll_slice: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            check_interval: Duration::from_secs(10),
            poll_slice: Duration::from_secs(1),
        }
    }
}

/// Tracks the previously observed health state and reports edges
///
/// The loop logs only on a state change, which suppresses log spam under
/// sustained steady state.
#[derive(Debug)]
pub struct HealthTransitions {
    last: HealthState,
}

impl HealthTransitions {
    pub fn new() -> Self {
        Self {
            last: HealthState::Unknown,
        }
    }

    pub fn last(&self) -> HealthState {
        self.last
    }

    /// Record an observation; returns the edge when it differs from the
    /// previous one.
    pub fn observe(&mut self, next: HealthState) -> Option<(HealthState, HealthState)> {
        let prev = self.last;
        self.last = next;
        (prev != next).then_some((prev, next))
    }
}

impl Default for HealthTransitions {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters maintained by the monitor loop
#[derive(Debug, Clone, Copy, Default)]
pub struct MonitorStats {
    pub probes: u64,
    pub restarts_attempted: u64,
    pub escalations: u64,
    pub transitions: u64,
}

/// The orchestrator: probes health on a fixed cadence, drives the backoff
/// policy, restarts the service on failure, and terminates only when the
/// exit flag trips
///
/// A single sequential task; it never runs two probes or two restarts at
/// once. No step blocks indefinitely: the probe is bounded by its timeout,
/// stop by the grace period, and every sleep polls the exit flag.
pub struct Monitor<P> {
    config: MonitorConfig,
    prober: P,
    controller: ProcessController,
    policy: BackoffPolicy,
    retry: RetryState,
    transitions: HealthTransitions,
    stats: MonitorStats,
    exit: ExitFlag,
}

impl<P: Prober> Monitor<P> {
    pub fn new(
        config: MonitorConfig,
        prober: P,
        controller: ProcessController,
        policy: BackoffPolicy,
        exit: ExitFlag,
    ) -> Self {
        let retry = policy.initial_state();
        Self {
            config,
            prober,
            controller,
            policy,
            retry,
            transitions: HealthTransitions::new(),
            stats: MonitorStats::default(),
            exit,
        }
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    pub fn retry_state(&self) -> RetryState {
        self.retry
    }

    pub fn last_health(&self) -> HealthState {
        self.transitions.last()
    }

    pub fn controller(&self) -> &ProcessController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ProcessController {
        &mut self.controller
    }

    /// Run the monitor loop until the exit flag trips
    ///
    /// The supervised process is left as-is on exit: the supervisor hands
    /// off control, it does not tear the service down.
    pub async fn run(&mut self) -> Result<()> {
        info!(
            "Starting health monitor for {} (interval {:?})",
            self.controller.name(),
            self.config.check_interval
        );

        loop {
            if self.exit.is_tripped() {
                info!("Exit signal received, stopping monitor");
                break;
            }

            self.check_once().await;

            if self
                .exit
                .sleep_unless_tripped(self.config.check_interval, self.config.poll_slice)
                .await
            {
                info!("Exit signal received during wait, stopping monitor");
                break;
            }
        }

        let stats = self.stats;
        info!(
            "Monitor exiting after {} probes ({} restarts, {} escalations); leaving {} as-is",
            stats.probes,
            stats.restarts_attempted,
            stats.escalations,
            self.controller.name()
        );

        Ok(())
    }

    /// One probe / recover cycle
    pub async fn check_once(&mut self) {
        debug!("Performing health check");
        let health = self.prober.probe().await;
        self.stats.probes += 1;

        if let Some((from, to)) = self.transitions.observe(health) {
            self.stats.transitions += 1;
            match to {
                HealthState::Healthy => {
                    info!("{} is healthy ({} -> {})", self.controller.name(), from, to)
                }
                _ => warn!(
                    "{} is unhealthy ({} -> {})",
                    self.controller.name(),
                    from,
                    to
                ),
            }
        }

        match health {
            HealthState::Healthy => {
                self.policy.on_success(&mut self.retry);
            }
            HealthState::Unhealthy => match self.policy.on_failure(&mut self.retry) {
                FailureAction::Restart { wait } => {
                    warn!(
                        "Retry {} of {} for {}",
                        self.retry.consecutive_failures,
                        self.policy.max_retries,
                        self.controller.name()
                    );
                    self.stats.restarts_attempted += 1;
                    if let Err(e) = self.controller.restart().await {
                        error!("Restart failed: {}", e);
                    }
                    debug!("Waiting {:?} before next check", wait);
                    self.exit
                        .sleep_unless_tripped(wait, self.config.poll_slice)
                        .await;
                }
                FailureAction::Escalate => {
                    // Log once at the crossing; in observe mode later failures
                    // keep incrementing the counter without restarting.
                    let crossing = match self.policy.on_exhausted {
                        EscalationPolicy::ContinueRestarting => true,
                        EscalationPolicy::ObserveOnly => {
                            self.retry.consecutive_failures == self.policy.max_retries + 1
                        }
                    };
                    if crossing {
                        self.stats.escalations += 1;
                        error!(
                            "Maximum retries ({}) exceeded for {}; manual intervention may be required",
                            self.policy.max_retries,
                            self.controller.name()
                        );
                    } else {
                        debug!(
                            "{} consecutive failures for {}; restarts suspended",
                            self.retry.consecutive_failures,
                            self.controller.name()
                        );
                    }
                }
            },
            HealthState::Unknown => {
                debug!("Probe returned no classification");
            }
        }
    }
}
