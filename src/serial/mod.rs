//! Serial IMU Link
//!
//! Owns the serial port carrying IMU records and click commands. The
//! estimator loop polls it non-blocking for at most one line per tick; the
//! click relay writes command bytes through the same handle, so the link is
//! shared behind a mutex and never touches fusion state itself.
//!
//! Port selection accepts a concrete device path or `"auto"`, which prefers
//! USB devices that look like the tracker firmware (product strings
//! containing "pico" or "usb serial") and falls back to the first port.

use std::io::{Read, Write};
use std::thread;
use std::time::Duration;

use serialport::{ClearBuffer, SerialPort, SerialPortInfo, SerialPortType};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Result type for link operations
pub type Result<T> = std::result::Result<T, LinkError>;

/// Serial link error types
#[derive(Error, Debug)]
pub enum LinkError {
    /// Auto-discovery found no serial ports at all
    #[error("No serial ports detected")]
    NoPortsDetected,

    /// Opening the chosen port failed
    #[error("Failed to open serial port {port}: {source}")]
    Open {
        /// Device path that was attempted
        port: String,
        /// Underlying driver error
        #[source]
        source: serialport::Error,
    },

    /// Port enumeration or control failed
    #[error("Serial port error: {0}")]
    Port(#[from] serialport::Error),

    /// Read or write failed
    #[error("Serial I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// How long the device gets to settle after the open-triggered reset
const SETTLE_DELAY: Duration = Duration::from_secs(2);

/// Read timeout; polls check `bytes_to_read` first so this rarely bites
const READ_TIMEOUT: Duration = Duration::from_millis(10);

/// Upper bound on buffered unread bytes before the oldest are dropped
const MAX_PENDING_BYTES: usize = 4096;

/// An open serial connection to the IMU device
pub struct SerialLink {
    port: Box<dyn SerialPort>,
    port_name: String,
    pending: Vec<u8>,
    healthy: bool,
}

impl SerialLink {
    /// Open a link on `spec` (device path or `"auto"`) at the given baud rate
    ///
    /// Blocks for a settle period after opening; firmware resets on open and
    /// the first bytes are garbage, so pending input is discarded.
    pub fn open(spec: &str, baud: u32) -> Result<Self> {
        let port_name = if spec.eq_ignore_ascii_case("auto") {
            discover_port()?
        } else {
            spec.to_string()
        };

        let port = serialport::new(&port_name, baud)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|source| LinkError::Open {
                port: port_name.clone(),
                source,
            })?;

        info!("IMU link connected: {} @ {} bps", port_name, baud);

        thread::sleep(SETTLE_DELAY);
        port.clear(ClearBuffer::Input)?;

        Ok(Self {
            port,
            port_name,
            pending: Vec::new(),
            healthy: true,
        })
    }

    /// Device path of the open port
    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Whether the link is still usable
    ///
    /// Cleared after a hard I/O error (device unplugged mid-run); the
    /// runtime then degrades to camera-only tracking.
    pub fn is_healthy(&self) -> bool {
        self.healthy
    }

    /// Fetch at most one pending record without blocking
    ///
    /// Drains whatever the OS already buffered, then returns the oldest
    /// complete line, trimmed. Returns `None` when no full line is pending
    /// or the link has failed.
    pub fn poll_record(&mut self) -> Option<String> {
        if !self.healthy {
            return None;
        }

        match self.port.bytes_to_read() {
            Ok(0) => {}
            Ok(available) => {
                let mut chunk = vec![0u8; available as usize];
                match self.port.read(&mut chunk) {
                    Ok(read) => self.pending.extend_from_slice(&chunk[..read]),
                    Err(err) if err.kind() == std::io::ErrorKind::TimedOut => {}
                    Err(err) => {
                        warn!("IMU link read failed on {}: {}", self.port_name, err);
                        self.healthy = false;
                        return None;
                    }
                }
            }
            Err(err) => {
                warn!("IMU link lost on {}: {}", self.port_name, err);
                self.healthy = false;
                return None;
            }
        }

        if self.pending.len() > MAX_PENDING_BYTES {
            let excess = self.pending.len() - MAX_PENDING_BYTES;
            self.pending.drain(..excess);
            warn!("IMU record backlog overflow, dropped {} bytes", excess);
        }

        take_line(&mut self.pending)
    }

    /// Write raw command bytes to the device
    pub fn send_command(&mut self, data: &str) -> Result<()> {
        self.port.write_all(data.as_bytes())?;
        self.port.flush()?;
        debug!("Sent serial command: {:?}", data);
        Ok(())
    }

    /// Retire the link
    ///
    /// Marks it unusable and discards buffered bytes. The device handle
    /// itself closes once the last owner drops it.
    pub fn close(&mut self) {
        if self.healthy {
            info!("Closing IMU link on {}", self.port_name);
        }
        self.healthy = false;
        self.pending.clear();
    }
}

/// Pop the oldest complete line out of a byte buffer
///
/// Lines end at `\n`; the returned text is trimmed. A blank line yields
/// `None` for this call but still consumes the bytes.
fn take_line(buffer: &mut Vec<u8>) -> Option<String> {
    let newline = buffer.iter().position(|&b| b == b'\n')?;
    let line: Vec<u8> = buffer.drain(..=newline).collect();
    let text = String::from_utf8_lossy(&line).trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Pick a port for `"auto"` mode
///
/// Logs every candidate, prefers USB devices whose product or manufacturer
/// strings look like the tracker firmware, then falls back to the first
/// port in enumeration order.
fn discover_port() -> Result<String> {
    let ports = serialport::available_ports()?;
    if ports.is_empty() {
        return Err(LinkError::NoPortsDetected);
    }

    info!("Available serial ports:");
    for port in &ports {
        info!("  - {} ({})", port.port_name, describe_port(port));
    }

    if let Some(preferred) = preferred_port(&ports) {
        info!("Auto-selected IMU port: {}", preferred.port_name);
        return Ok(preferred.port_name.clone());
    }

    let first = &ports[0];
    info!(
        "No recognizable IMU device, falling back to first port: {}",
        first.port_name
    );
    Ok(first.port_name.clone())
}

/// Find the first port whose USB strings match the tracker firmware
fn preferred_port(ports: &[SerialPortInfo]) -> Option<&SerialPortInfo> {
    ports.iter().find(|port| {
        let description = describe_port(port).to_lowercase();
        description.contains("pico") || description.contains("usb serial")
    })
}

/// Human-readable port description for logs and matching
fn describe_port(port: &SerialPortInfo) -> String {
    match &port.port_type {
        SerialPortType::UsbPort(usb) => {
            let product = usb.product.as_deref().unwrap_or("unknown");
            match usb.manufacturer.as_deref() {
                Some(manufacturer) => format!("{product}, {manufacturer}"),
                None => product.to_string(),
            }
        }
        SerialPortType::PciPort => "PCI".to_string(),
        SerialPortType::BluetoothPort => "Bluetooth".to_string(),
        SerialPortType::Unknown => "unknown".to_string(),
    }
}
