// CLI module - user-facing commands for the warden binary

use crate::config::SupervisorConfig;
use crate::error::{Result, WardenError};
use crate::exit::{ExitFlag, TriggerServer};
use crate::health::HttpProber;
use crate::monitor::backoff::BackoffPolicy;
use crate::monitor::{Monitor, MonitorConfig};
use crate::process::ProcessController;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Warden - a self-healing supervisor for a long-running network service
#[derive(Parser)]
#[command(name = "warden")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the service and monitor its health until told to exit
    Run {
        /// Path to the supervisor configuration file (TOML or JSON)
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Tell a running supervisor to stop monitoring and exit
    Stop {
        /// Host the control listener is bound to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Control listener port
        #[arg(long, default_value_t = crate::config::DEFAULT_CONTROL_PORT)]
        port: u16,

        /// Trigger path
        #[arg(long, default_value = crate::config::DEFAULT_CONTROL_PATH)]
        path: String,
    },
}

impl Cli {
    /// Parse arguments and execute the selected command
    pub async fn run() -> Result<()> {
        let cli = Cli::parse();
        match cli.command {
            Commands::Run { config } => run_supervisor(&config).await,
            Commands::Stop { host, port, path } => send_exit_trigger(&host, port, &path).await,
        }
    }
}

/// Host the supervisor: start the service, expose the exit trigger, and run
/// the monitor loop to completion
async fn run_supervisor(config_path: &PathBuf) -> Result<()> {
    let config = SupervisorConfig::from_file(config_path)?;
    info!(
        "Loaded configuration for '{}' from {}",
        config.name,
        config_path.display()
    );

    let exit = ExitFlag::new();

    let server = TriggerServer::bind(&config.control_addr(), &config.control_path).await?;
    let listener_flag = exit.clone();
    tokio::spawn(async move {
        if let Err(e) = server.serve(listener_flag).await {
            error!("Control listener failed: {}", e);
        }
    });

    // Ctrl-C trips the same flag as the remote trigger, so the loop still
    // has exactly one termination path.
    let signal_flag = exit.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Received interrupt signal");
            signal_flag.trip();
        }
    });

    let prober = HttpProber::new(&config.health_url, config.probe_timeout())?;
    let policy = BackoffPolicy::from_config(
        config.initial_backoff(),
        config.max_retries,
        config.max_backoff(),
        config.on_exhausted,
    );
    let monitor_config = MonitorConfig {
        check_interval: config.check_interval(),
        poll_slice: config.poll_slice(),
    };

    let mut controller = ProcessController::new(config);
    if let Err(e) = controller.start().await {
        // Not fatal: the monitor will observe the missing service as
        // unhealthy and keep attempting restarts.
        warn!("Initial start failed: {}", e);
    }

    let mut monitor = Monitor::new(monitor_config, prober, controller, policy, exit);
    monitor.run().await
}

/// Client side of the control surface: POST the exit trigger and report the
/// acknowledgement
async fn send_exit_trigger(host: &str, port: u16, path: &str) -> Result<()> {
    let url = format!("http://{}:{}{}", host, port, path);
    let client = reqwest::Client::new();

    let response = client.post(&url).send().await.map_err(|e| {
        WardenError::Control(format!("Failed to reach supervisor at {}: {}", url, e))
    })?;

    let status = response.status();
    let body = response.text().await.unwrap_or_default();

    if status.is_success() {
        println!("Supervisor acknowledged exit: {}", body.trim());
        Ok(())
    } else {
        Err(WardenError::Control(format!(
            "Supervisor returned HTTP {}: {}",
            status,
            body.trim()
        )))
    }
}
