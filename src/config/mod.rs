use crate::error::{Result, WardenError};
use crate::monitor::backoff::EscalationPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default port for the exit-trigger listener
pub const DEFAULT_CONTROL_PORT: u16 = 9660;

/// Default path for the exit-trigger endpoint
pub const DEFAULT_CONTROL_PATH: &str = "/exit";

/// Supervisor configuration: the supervised service's command line, the
/// health probe, the restart policy, and the control listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Display name for the supervised service
    #[serde(default = "default_name")]
    pub name: String,

    /// Path to the executable to supervise
    pub command: PathBuf,

    /// Command-line arguments
    #[serde(default)]
    pub args: Vec<String>,

    /// Working directory for the service
    #[serde(default)]
    pub cwd: Option<PathBuf>,

    /// Environment variables
    #[serde(default)]
    pub env: HashMap<String, String>,

    /// URL probed to decide whether the service is healthy
    pub health_url: String,

    /// Timeout for a single health probe (in seconds)
    #[serde(default = "default_probe_timeout")]
    pub probe_timeout_secs: u64,

    /// Interval between health probes (in seconds)
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// Granularity at which sleeps poll the exit flag (in seconds)
    #[serde(default = "default_poll_slice")]
    pub poll_slice_secs: u64,

    /// Backoff imposed after the first failed probe (in seconds)
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_secs: u64,

    /// Upper bound on the doubling backoff (in seconds); absent = unbounded
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: Option<u64>,

    /// Consecutive failures tolerated before escalating
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay between stop and start during a restart, so the previous
    /// instance can release its listening port (in seconds)
    #[serde(default = "default_settle_delay")]
    pub settle_delay_secs: u64,

    /// Grace period for the service to exit after SIGTERM (in seconds)
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout_secs: u64,

    /// Send SIGKILL when the grace period expires (default: report and
    /// leave the process running)
    #[serde(default)]
    pub escalate_to_kill: bool,

    /// What to do once the retry budget is exhausted
    #[serde(default)]
    pub on_exhausted: EscalationPolicy,

    /// Address the exit-trigger listener binds to
    #[serde(default = "default_control_bind")]
    pub control_bind: String,

    /// Port the exit-trigger listener binds to
    #[serde(default = "default_control_port")]
    pub control_port: u16,

    /// Path of the exit-trigger endpoint
    #[serde(default = "default_control_path")]
    pub control_path: String,
}

// Default value functions for serde
fn default_name() -> String {
    "service".to_string()
}

fn default_probe_timeout() -> u64 {
    5
}

fn default_check_interval() -> u64 {
    10
}

fn default_poll_slice() -> u64 {
    1
}

fn default_initial_backoff() -> u64 {
    2
}

fn default_max_backoff() -> Option<u64> {
    Some(60)
}

fn default_max_retries() -> u32 {
    5
}

fn default_settle_delay() -> u64 {
    2
}

fn default_stop_timeout() -> u64 {
    10
}

fn default_control_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_control_port() -> u16 {
    DEFAULT_CONTROL_PORT
}

fn default_control_path() -> String {
    DEFAULT_CONTROL_PATH.to_string()
}

impl SupervisorConfig {
    /// Load the supervisor configuration from a file (supports TOML and JSON)
    pub fn from_file(path: &Path) -> Result<SupervisorConfig> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| WardenError::Config(format!("Failed to read config file: {}", e)))?;

        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");

        let config: SupervisorConfig = match extension {
            "toml" => toml::from_str(&contents)
                .map_err(|e| WardenError::InvalidConfig(format!("Invalid TOML: {}", e)))?,
            "json" => serde_json::from_str(&contents)
                .map_err(|e| WardenError::InvalidConfig(format!("Invalid JSON: {}", e)))?,
            _ => {
                return Err(WardenError::InvalidConfig(format!(
                    "Unsupported file format: {}. Use .toml or .json",
                    extension
                )))
            }
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.command.as_os_str().is_empty() {
            return Err(WardenError::InvalidConfig(
                "command must not be empty".to_string(),
            ));
        }

        if !self.health_url.starts_with("http://") && !self.health_url.starts_with("https://") {
            return Err(WardenError::InvalidConfig(format!(
                "health_url must be an http(s) URL, got '{}'",
                self.health_url
            )));
        }

        if self.probe_timeout_secs == 0 {
            return Err(WardenError::InvalidConfig(
                "probe_timeout_secs must be greater than 0".to_string(),
            ));
        }

        if self.check_interval_secs == 0 {
            return Err(WardenError::InvalidConfig(
                "check_interval_secs must be greater than 0".to_string(),
            ));
        }

        if self.poll_slice_secs == 0 {
            return Err(WardenError::InvalidConfig(
                "poll_slice_secs must be greater than 0".to_string(),
            ));
        }

        if self.max_retries == 0 {
            return Err(WardenError::InvalidConfig(
                "max_retries must be greater than 0".to_string(),
            ));
        }

        if !self.control_path.starts_with('/') {
            return Err(WardenError::InvalidConfig(format!(
                "control_path must start with '/', got '{}'",
                self.control_path
            )));
        }

        Ok(())
    }

    /// Get the probe timeout as a Duration
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    /// Get the inter-probe interval as a Duration
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    /// Get the exit-flag polling slice as a Duration
    pub fn poll_slice(&self) -> Duration {
        Duration::from_secs(self.poll_slice_secs)
    }

    /// Get the initial backoff as a Duration
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_secs(self.initial_backoff_secs)
    }

    /// Get the backoff cap as a Duration, if one is configured
    pub fn max_backoff(&self) -> Option<Duration> {
        self.max_backoff_secs.map(Duration::from_secs)
    }

    /// Get the restart settling delay as a Duration
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    /// Get the stop grace period as a Duration
    pub fn stop_timeout(&self) -> Duration {
        Duration::from_secs(self.stop_timeout_secs)
    }

    /// Address string for the control listener
    pub fn control_addr(&self) -> String {
        format!("{}:{}", self.control_bind, self.control_port)
    }
}
