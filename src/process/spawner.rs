use crate::config::SupervisorConfig;
use crate::error::{Result, WardenError};
use crate::process::types::SupervisedProcess;
use tokio::process::Command;

/// Spawn the supervised service from its configured command line
///
/// Builds a tokio::process::Command from the configuration, applying:
/// - Command-line arguments
/// - Working directory
/// - Environment variables
///
/// Stdout and stderr are inherited so the service writes to the shared
/// console; this crate does not capture or rotate service output.
///
/// # Arguments
/// * `config` - Supervisor configuration containing the service command line
///
/// # Returns
/// * `Ok(SupervisedProcess)` - Successfully spawned instance with its pid
/// * `Err(WardenError)` - Failed to spawn the service
pub fn spawn_service(config: &SupervisorConfig) -> Result<SupervisedProcess> {
    let mut command = Command::new(&config.command);

    if !config.args.is_empty() {
        command.args(&config.args);
    }

    if let Some(ref cwd) = config.cwd {
        command.current_dir(cwd);
    }

    for (key, value) in &config.env {
        command.env(key, value);
    }

    let child = command.spawn().map_err(|e| {
        WardenError::Spawn(format!(
            "Failed to spawn '{}': {}",
            config.command.display(),
            e
        ))
    })?;

    let pid = child.id().ok_or_else(|| {
        WardenError::Spawn(format!(
            "Failed to get PID for '{}'",
            config.command.display()
        ))
    })?;

    Ok(SupervisedProcess::new(child, pid))
}
