//! Click relay service
//!
//! Small HTTP surface for the companion remote. A phone (or `curl`) on the
//! same network requests `/send/1` or `/send/2` and the relay forwards the
//! digit to the IMU device over the shared serial link, which fires the
//! matching mouse button on the device side. `/status` reports the
//! tracker's latest mode and pointer target as JSON.
//!
//! The protocol is deliberately tiny: one request line per connection,
//! respond, close. No keep-alive, no routing table.

use anyhow::{Context, Result};
use parking_lot::Mutex;
use std::net::{IpAddr, SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::runtime::StatusCell;
use crate::serial::SerialLink;

/// Relay request statistics
#[derive(Debug)]
pub struct RelayStats {
    /// Connections accepted
    pub total_requests: AtomicU64,
    /// Click commands forwarded to the device
    pub commands_sent: AtomicU64,
    /// Requests answered with a 4xx
    pub rejected_requests: AtomicU64,
    /// Service start time
    pub start_time: SystemTime,
}

impl RelayStats {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            total_requests: AtomicU64::new(0),
            commands_sent: AtomicU64::new(0),
            rejected_requests: AtomicU64::new(0),
            start_time: SystemTime::now(),
        })
    }
}

/// What a request line asks the relay to do
#[derive(Debug, Clone, PartialEq, Eq)]
enum Route {
    /// Forward a click command digit to the device
    Send(String),
    /// Report the latest tracker status
    Status,
    /// `/send/` payload the device does not understand
    BadCommand(String),
    /// Path the relay does not serve
    NotFound,
    /// Not a GET, or not parseable as HTTP at all
    BadRequest,
}

/// Classify one HTTP request line
fn route_request(line: &str) -> Route {
    let mut parts = line.split_whitespace();
    let (method, path) = match (parts.next(), parts.next()) {
        (Some(method), Some(path)) => (method, path),
        _ => return Route::BadRequest,
    };

    if method != "GET" {
        return Route::BadRequest;
    }

    if path == "/status" {
        return Route::Status;
    }

    match path.strip_prefix("/send/") {
        Some(payload @ ("1" | "2")) => Route::Send(payload.to_string()),
        Some(payload) => Route::BadCommand(payload.to_string()),
        None => Route::NotFound,
    }
}

/// Click relay service
pub struct RelayService {
    listen: SocketAddr,
    serial: Option<Arc<Mutex<SerialLink>>>,
    status: StatusCell,
    stats: Arc<RelayStats>,
}

/// Handle to a running relay
pub struct RelayHandle {
    shutdown_tx: mpsc::Sender<()>,
    local_addr: SocketAddr,
    stats: Arc<RelayStats>,
}

impl RelayHandle {
    /// Address the relay actually bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Relay statistics
    pub fn stats(&self) -> Arc<RelayStats> {
        Arc::clone(&self.stats)
    }

    /// Ask the accept loop to stop
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}

impl RelayService {
    /// Create a relay bound to nothing yet
    pub fn new(
        listen: SocketAddr,
        serial: Option<Arc<Mutex<SerialLink>>>,
        status: StatusCell,
    ) -> Self {
        Self {
            listen,
            serial,
            status,
            stats: RelayStats::new(),
        }
    }

    /// Bind and start serving
    pub async fn start(&self) -> Result<RelayHandle> {
        let listener = TcpListener::bind(self.listen)
            .await
            .context("Failed to bind relay listen address")?;
        let local_addr = listener.local_addr()?;
        info!("Click relay listening on {}", local_addr);
        log_reachable_urls(local_addr);

        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let serial = self.serial.clone();
        let status = Arc::clone(&self.status);
        let stats = Arc::clone(&self.stats);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, addr)) => {
                                stats.total_requests.fetch_add(1, Ordering::Relaxed);

                                let serial = serial.clone();
                                let status = Arc::clone(&status);
                                let stats = Arc::clone(&stats);

                                tokio::spawn(async move {
                                    if let Err(e) =
                                        handle_connection(stream, addr, serial, status, stats).await
                                    {
                                        debug!("Relay connection from {} failed: {}", addr, e);
                                    }
                                });
                            }
                            Err(e) => {
                                error!("Relay accept failed: {}", e);
                            }
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        info!("Click relay shutdown requested");
                        break;
                    }
                }
            }

            info!("Click relay stopped");
        });

        Ok(RelayHandle {
            shutdown_tx,
            local_addr,
            stats: Arc::clone(&self.stats),
        })
    }
}

/// Serve exactly one request on a fresh connection
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    serial: Option<Arc<Mutex<SerialLink>>>,
    status: StatusCell,
    stats: Arc<RelayStats>,
) -> Result<()> {
    let mut reader = BufReader::new(stream);
    let mut line = String::new();
    reader.read_line(&mut line).await?;

    let route = route_request(&line);
    debug!("Relay request from {}: {:?}", addr, route);

    let mut stream = reader.into_inner();
    match route {
        Route::Send(payload) => match serial {
            Some(link) => {
                let sent = tokio::task::spawn_blocking(move || {
                    let mut link = link.lock();
                    if !link.is_healthy() {
                        return None;
                    }
                    Some(link.send_command(&payload))
                })
                .await
                .context("Serial write task failed")?;

                match sent {
                    Some(Ok(())) => {
                        stats.commands_sent.fetch_add(1, Ordering::Relaxed);
                        respond(&mut stream, 200, "OK", "text/plain", "sent\n").await?;
                    }
                    Some(Err(e)) => {
                        warn!("Relay could not write to serial: {}", e);
                        respond(
                            &mut stream,
                            500,
                            "Internal Server Error",
                            "text/plain",
                            "serial write failed\n",
                        )
                        .await?;
                    }
                    None => {
                        respond(
                            &mut stream,
                            503,
                            "Service Unavailable",
                            "text/plain",
                            "serial link unavailable\n",
                        )
                        .await?;
                    }
                }
            }
            None => {
                respond(
                    &mut stream,
                    503,
                    "Service Unavailable",
                    "text/plain",
                    "serial link unavailable\n",
                )
                .await?;
            }
        },
        Route::Status => {
            let snapshot = *status.read();
            let body = serde_json::to_string(&snapshot).context("Status serialization failed")?;
            respond(&mut stream, 200, "OK", "application/json", &body).await?;
        }
        Route::BadCommand(payload) => {
            stats.rejected_requests.fetch_add(1, Ordering::Relaxed);
            debug!("Relay rejected command {:?} from {}", payload, addr);
            respond(&mut stream, 400, "Bad Request", "text/plain", "unknown command\n").await?;
        }
        Route::NotFound => {
            stats.rejected_requests.fetch_add(1, Ordering::Relaxed);
            respond(&mut stream, 404, "Not Found", "text/plain", "not found\n").await?;
        }
        Route::BadRequest => {
            stats.rejected_requests.fetch_add(1, Ordering::Relaxed);
            respond(&mut stream, 400, "Bad Request", "text/plain", "bad request\n").await?;
        }
    }

    Ok(())
}

/// Write a complete one-shot HTTP response
async fn respond(
    stream: &mut TcpStream,
    code: u16,
    reason: &str,
    content_type: &str,
    body: &str,
) -> Result<()> {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        code,
        reason,
        content_type,
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.shutdown().await?;
    Ok(())
}

/// Log URLs a phone on the LAN can actually reach
///
/// For a wildcard bind the listener's own address is useless to type into
/// a browser, so discover the outbound interface address the way the OS
/// routes it.
fn log_reachable_urls(local_addr: SocketAddr) {
    let ip = if local_addr.ip().is_unspecified() {
        outbound_ip()
    } else {
        Some(local_addr.ip())
    };

    if let Some(ip) = ip {
        info!("Remote control: http://{}:{}/send/1", ip, local_addr.port());
        info!("Status page:    http://{}:{}/status", ip, local_addr.port());
    }
}

/// Local address of the default outbound route
///
/// Connecting a UDP socket never sends a packet; it only asks the kernel
/// which source address it would pick.
fn outbound_ip() -> Option<IpAddr> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    Some(socket.local_addr().ok()?.ip())
}
