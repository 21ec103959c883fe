// Shared fixtures for the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use warden::config::SupervisorConfig;
use warden::monitor::backoff::EscalationPolicy;

/// A minimal health endpoint whose responses can be flipped between
/// healthy (200) and unhealthy (503) while the server runs.
pub struct HealthEndpoint {
    addr: SocketAddr,
    healthy: Arc<AtomicBool>,
}

impl HealthEndpoint {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let healthy = Arc::new(AtomicBool::new(true));

        let state = healthy.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let state = state.clone();
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = stream.read(&mut buf).await;
                    let (status, body) = if state.load(Ordering::SeqCst) {
                        ("200 OK", r#"{"status":"healthy"}"#)
                    } else {
                        ("503 Service Unavailable", r#"{"status":"unhealthy"}"#)
                    };
                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                });
            }
        });

        Self { addr, healthy }
    }

    pub fn url(&self) -> String {
        format!("http://{}/health", self.addr)
    }

    pub fn set_healthy(&self, value: bool) {
        self.healthy.store(value, Ordering::SeqCst);
    }
}

/// Configuration for supervising a plain long-lived `/bin/sleep` instance,
/// with delays short enough for tests.
pub fn sleep_service_config(health_url: String) -> SupervisorConfig {
    SupervisorConfig {
        name: "sleep-service".to_string(),
        command: PathBuf::from("/bin/sleep"),
        args: vec!["300".to_string()],
        cwd: None,
        env: HashMap::new(),
        health_url,
        probe_timeout_secs: 1,
        check_interval_secs: 1,
        poll_slice_secs: 1,
        initial_backoff_secs: 1,
        max_backoff_secs: Some(60),
        max_retries: 5,
        settle_delay_secs: 0,
        stop_timeout_secs: 5,
        escalate_to_kill: false,
        on_exhausted: EscalationPolicy::ObserveOnly,
        control_bind: "127.0.0.1".to_string(),
        control_port: 0,
        control_path: "/exit".to_string(),
    }
}
