use crate::error::{Result, WardenError};
use crate::exit::ExitFlag;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

/// Minimal HTTP control listener: a POST to the trigger path sets the exit
/// flag and returns an acknowledgement
///
/// Deliberately minimal out-of-band control surface: no authentication, no
/// payload. It runs independently of the monitor loop so the trigger is
/// reachable even while the loop is sleeping or mid-restart.
pub struct TriggerServer {
    listener: TcpListener,
    trigger_path: String,
}

impl TriggerServer {
    /// Bind the control listener
    ///
    /// Binding is separate from serving so that an address conflict surfaces
    /// before the monitor loop starts.
    pub async fn bind(addr: &str, trigger_path: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            WardenError::Control(format!("Failed to bind control listener on {}: {}", addr, e))
        })?;

        Ok(Self {
            listener,
            trigger_path: trigger_path.to_string(),
        })
    }

    /// Address the listener is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(WardenError::Io)
    }

    /// Accept connections until the hosting task is dropped
    ///
    /// Each connection carries at most one request. Per-connection errors
    /// are logged and the accept loop continues.
    pub async fn serve(self, flag: ExitFlag) -> Result<()> {
        info!(
            "Control listener on {} (POST {} to stop the supervisor)",
            self.local_addr()?,
            self.trigger_path
        );

        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(conn) => conn,
                Err(e) => {
                    warn!("Failed to accept control connection: {}", e);
                    continue;
                }
            };

            debug!("Control connection from {}", peer);
            if let Err(e) = handle_trigger(stream, &self.trigger_path, &flag).await {
                warn!("Control connection error: {}", e);
            }
        }
    }
}

/// Parse one request off the connection and answer it
///
/// `POST <trigger_path>` trips the flag; repeated calls after the flag is
/// set still acknowledge success.
async fn handle_trigger(mut stream: TcpStream, trigger_path: &str, flag: &ExitFlag) -> Result<()> {
    let (reader, mut writer) = stream.split();
    let mut lines = BufReader::new(reader).lines();

    let request_line = lines
        .next_line()
        .await
        .map_err(|e| WardenError::Control(format!("Failed to read request: {}", e)))?
        .unwrap_or_default();

    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or("");
    let path = parts.next().unwrap_or("");

    // Drain headers so the peer gets the response after a clean read.
    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|e| WardenError::Control(format!("Failed to read headers: {}", e)))?
    {
        if line.is_empty() {
            break;
        }
    }

    let (status, body) = if method.is_empty() || path.is_empty() {
        (
            "400 Bad Request",
            serde_json::json!({ "error": "malformed request" }),
        )
    } else if path != trigger_path {
        (
            "404 Not Found",
            serde_json::json!({ "error": format!("unknown path {}", path) }),
        )
    } else if method != "POST" {
        (
            "405 Method Not Allowed",
            serde_json::json!({ "error": "use POST" }),
        )
    } else {
        if flag.trip() {
            info!("Exit trigger received; supervisor will stop monitoring");
        } else {
            debug!("Exit trigger repeated; flag already set");
        }
        (
            "200 OK",
            serde_json::json!({ "status": "ok", "exiting": true }),
        )
    };

    let body = body.to_string();
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );

    writer
        .write_all(response.as_bytes())
        .await
        .map_err(|e| WardenError::Control(format!("Failed to write response: {}", e)))?;
    writer
        .shutdown()
        .await
        .map_err(|e| WardenError::Control(format!("Failed to close connection: {}", e)))?;

    Ok(())
}
