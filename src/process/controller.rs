use crate::config::SupervisorConfig;
use crate::error::{Result, WardenError};
use crate::process::spawner::spawn_service;
use crate::process::types::{ServiceStatus, SupervisedProcess};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::time::{sleep, timeout};
use tracing::{error, info, warn};

/// Owns the lifecycle of the single supervised service: launch,
/// detect-already-running, terminate with a bounded grace period, relaunch.
///
/// The controller holds at most one live handle at a time; a restart
/// replaces the handle rather than mutating it.
pub struct ProcessController {
    config: SupervisorConfig,
    current: Option<SupervisedProcess>,
    ever_started: bool,
    restarts: u64,
}

impl ProcessController {
    pub fn new(config: SupervisorConfig) -> Self {
        Self {
            config,
            current: None,
            ever_started: false,
            restarts: 0,
        }
    }

    /// Display name of the supervised service
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// PID of the current instance, if one is held
    pub fn pid(&self) -> Option<u32> {
        self.current.as_ref().map(|p| p.pid)
    }

    /// Number of restarts performed since the controller was created
    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    /// Current lifecycle status of the supervised service
    pub fn status(&mut self) -> ServiceStatus {
        match self.current {
            Some(ref mut process) => {
                if process.is_running() {
                    ServiceStatus::Running
                } else {
                    ServiceStatus::Stopped
                }
            }
            None if self.ever_started => ServiceStatus::Stopped,
            None => ServiceStatus::NotStarted,
        }
    }

    /// Start the supervised service
    ///
    /// Idempotent: if the held instance is still running this is a no-op
    /// that returns the existing pid. A spawn failure leaves no handle
    /// behind; the caller decides whether to retry.
    pub async fn start(&mut self) -> Result<u32> {
        if let Some(ref mut process) = self.current {
            if process.is_running() {
                info!("{} is already running (pid {})", self.config.name, process.pid);
                return Ok(process.pid);
            }
        }

        let spawned = spawn_service(&self.config)?;
        let pid = spawned.pid;
        info!("Started {} (pid {})", self.config.name, pid);

        self.current = Some(spawned);
        self.ever_started = true;

        Ok(pid)
    }

    /// Stop the supervised service
    ///
    /// No-op when no live instance is held. Otherwise sends SIGTERM and
    /// waits up to the configured grace period for the process to exit.
    /// When the grace period expires the default is to report the failure
    /// and keep the still-live handle; with `escalate_to_kill` the process
    /// is killed with SIGKILL instead.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(mut process) = self.current.take() else {
            info!("No active {} process to stop", self.config.name);
            return Ok(());
        };

        if !process.is_running() {
            info!(
                "{} (pid {}) has already exited",
                self.config.name, process.pid
            );
            return Ok(());
        }

        let pid = process.pid;
        info!(
            "Terminating {} (pid {}) with SIGTERM",
            self.config.name, pid
        );

        if let Err(e) = signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            self.current = Some(process);
            return Err(WardenError::Signal(format!(
                "Failed to send SIGTERM to pid {}: {}",
                pid, e
            )));
        }

        let grace = self.config.stop_timeout();
        match timeout(grace, process.child.wait()).await {
            Ok(Ok(status)) => {
                info!("{} (pid {}) exited with {}", self.config.name, pid, status);
                Ok(())
            }
            Ok(Err(e)) => Err(WardenError::Stop(format!(
                "Wait for pid {} failed: {}",
                pid, e
            ))),
            Err(_) if self.config.escalate_to_kill => {
                warn!(
                    "{} (pid {}) did not exit within {:?}, sending SIGKILL",
                    self.config.name, pid, grace
                );
                signal::kill(Pid::from_raw(pid as i32), Signal::SIGKILL).map_err(|e| {
                    WardenError::Signal(format!("Failed to send SIGKILL to pid {}: {}", pid, e))
                })?;
                let _ = process.child.wait().await;
                info!("{} (pid {}) killed", self.config.name, pid);
                Ok(())
            }
            Err(_) => {
                error!(
                    "{} (pid {}) did not exit within {:?}; leaving it running",
                    self.config.name, pid, grace
                );
                self.current = Some(process);
                Err(WardenError::StopTimeout(grace))
            }
        }
    }

    /// Restart the supervised service
    ///
    /// Stops the current instance, waits for the settling delay so the
    /// previous instance can release its listening port, then starts a new
    /// one. A termination failure is logged rather than propagated; the
    /// subsequent `start` is a no-op while the old instance is still alive,
    /// so two live instances can never result.
    pub async fn restart(&mut self) -> Result<u32> {
        info!("Restarting {}", self.config.name);

        if let Err(e) = self.stop().await {
            warn!("Stop during restart failed: {}", e);
        }

        sleep(self.config.settle_delay()).await;

        let pid = self.start().await?;
        self.restarts += 1;
        Ok(pid)
    }
}
