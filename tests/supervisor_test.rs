// End-to-end tests: monitor loop + process controller + health endpoint +
// exit trigger wired together the way the binary wires them

mod common;

use common::HealthEndpoint;
use std::time::{Duration, Instant};
use warden::exit::{ExitFlag, TriggerServer};
use warden::health::{HealthState, HttpProber};
use warden::monitor::backoff::{BackoffPolicy, EscalationPolicy};
use warden::monitor::{Monitor, MonitorConfig};
use warden::process::{ProcessController, ServiceStatus};

fn fast_monitor_config() -> MonitorConfig {
    MonitorConfig {
        check_interval: Duration::from_millis(30),
        poll_slice: Duration::from_millis(10),
    }
}

fn fast_policy() -> BackoffPolicy {
    BackoffPolicy::from_config(
        Duration::from_millis(20),
        5,
        Some(Duration::from_millis(100)),
        EscalationPolicy::ObserveOnly,
    )
}

#[tokio::test]
async fn test_supervisor_recovers_service_and_exits_on_trigger() -> anyhow::Result<()> {
    let endpoint = HealthEndpoint::start().await;

    let exit = ExitFlag::new();
    let server = TriggerServer::bind("127.0.0.1:0", "/exit").await?;
    let control_addr = server.local_addr()?;
    tokio::spawn(server.serve(exit.clone()));

    let mut controller = ProcessController::new(common::sleep_service_config(endpoint.url()));
    controller.start().await?;

    let prober = HttpProber::new(endpoint.url(), Duration::from_millis(500))?;
    let mut monitor = Monitor::new(
        fast_monitor_config(),
        prober,
        controller,
        fast_policy(),
        exit.clone(),
    );

    let handle = tokio::spawn(async move {
        monitor.run().await.unwrap();
        monitor
    });

    // Let the loop observe a healthy service, then break it.
    tokio::time::sleep(Duration::from_millis(100)).await;
    endpoint.set_healthy(false);
    tokio::time::sleep(Duration::from_millis(250)).await;
    endpoint.set_healthy(true);
    tokio::time::sleep(Duration::from_millis(100)).await;

    // Stop the supervisor through the remote trigger.
    let client = reqwest::Client::new();
    let ack = client
        .post(format!("http://{}/exit", control_addr))
        .send()
        .await?;
    assert!(ack.status().is_success());

    let mut monitor = tokio::time::timeout(Duration::from_secs(5), handle).await??;

    let stats = monitor.stats();
    assert!(stats.probes >= 3);
    assert!(
        stats.restarts_attempted >= 1,
        "unhealthy window must have caused a restart"
    );
    assert_eq!(monitor.last_health(), HealthState::Healthy);

    // The supervisor hands off: the service is left running on exit.
    assert_eq!(monitor.controller_mut().status(), ServiceStatus::Running);
    monitor.controller_mut().stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_exit_trigger_stops_loop_without_restarts() -> anyhow::Result<()> {
    let endpoint = HealthEndpoint::start().await;

    let exit = ExitFlag::new();
    let server = TriggerServer::bind("127.0.0.1:0", "/exit").await?;
    let control_addr = server.local_addr()?;
    tokio::spawn(server.serve(exit.clone()));

    let mut controller = ProcessController::new(common::sleep_service_config(endpoint.url()));
    controller.start().await?;

    let prober = HttpProber::new(endpoint.url(), Duration::from_millis(500))?;
    let mut monitor = Monitor::new(
        fast_monitor_config(),
        prober,
        controller,
        fast_policy(),
        exit.clone(),
    );

    let handle = tokio::spawn(async move {
        monitor.run().await.unwrap();
        monitor
    });

    tokio::time::sleep(Duration::from_millis(80)).await;

    // Two triggers in quick succession: both acknowledged, one termination.
    let client = reqwest::Client::new();
    let url = format!("http://{}/exit", control_addr);
    let triggered_at = Instant::now();
    let first = client.post(&url).send().await?;
    let second = client.post(&url).send().await?;
    assert!(first.status().is_success());
    assert!(second.status().is_success());

    let mut monitor = tokio::time::timeout(Duration::from_secs(5), handle).await??;

    // The loop must notice the flag within one inter-probe interval.
    assert!(triggered_at.elapsed() < Duration::from_secs(2));
    assert_eq!(monitor.stats().restarts_attempted, 0);

    monitor.controller_mut().stop().await?;
    Ok(())
}

#[tokio::test]
async fn test_unhealthy_service_is_restarted_with_new_pid() -> anyhow::Result<()> {
    let endpoint = HealthEndpoint::start().await;
    endpoint.set_healthy(false);

    let exit = ExitFlag::new();

    let mut controller = ProcessController::new(common::sleep_service_config(endpoint.url()));
    let first_pid = controller.start().await?;

    let prober = HttpProber::new(endpoint.url(), Duration::from_millis(500))?;
    let mut monitor = Monitor::new(
        fast_monitor_config(),
        prober,
        controller,
        fast_policy(),
        exit.clone(),
    );

    let handle = tokio::spawn(async move {
        monitor.run().await.unwrap();
        monitor
    });

    // Wait for at least one restart, then recover and stop the loop.
    tokio::time::sleep(Duration::from_millis(250)).await;
    endpoint.set_healthy(true);
    tokio::time::sleep(Duration::from_millis(100)).await;
    exit.trip();

    let mut monitor = tokio::time::timeout(Duration::from_secs(5), handle).await??;

    assert!(monitor.controller().restarts() >= 1);
    let current_pid = monitor.controller().pid();
    assert!(current_pid.is_some());
    assert_ne!(current_pid, Some(first_pid), "restart must replace the instance");

    monitor.controller_mut().stop().await?;
    Ok(())
}
