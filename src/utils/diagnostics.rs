//! Startup Environment Diagnostics
//!
//! One-shot snapshot of the host, the graphical session and the attached
//! serial devices, logged before tracking starts. Most field reports of a
//! lagging cursor or a silent IMU are answered by this block in the log.

use sysinfo::System;
use tracing::info;

/// Host snapshot taken once at startup
#[derive(Debug, Clone)]
pub struct SystemInfo {
    /// Operating system, name and version combined
    pub os: String,
    /// Kernel release
    pub kernel: String,
    /// Machine hostname
    pub hostname: String,
    /// Logical CPU count; the per-frame scan is CPU bound
    pub cpu_count: usize,
    /// CPU model string
    pub cpu_brand: String,
    /// Total memory in megabytes
    pub total_memory_mb: u64,
}

impl SystemInfo {
    /// Gather the snapshot from the running system
    pub fn gather() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        let unknown = || "unknown".to_string();
        Self {
            os: format!(
                "{} {}",
                System::name().unwrap_or_else(unknown),
                System::os_version().unwrap_or_else(unknown),
            ),
            kernel: System::kernel_version().unwrap_or_else(unknown),
            hostname: System::host_name().unwrap_or_else(unknown),
            cpu_count: sys.cpus().len(),
            cpu_brand: sys
                .cpus()
                .first()
                .map(|cpu| cpu.brand().to_string())
                .unwrap_or_else(unknown),
            total_memory_mb: sys.total_memory() / 1024 / 1024,
        }
    }

    /// Write the snapshot to the log
    pub fn log(&self) {
        info!("=== Host ===");
        info!("  OS: {}", self.os);
        info!("  Kernel: {}", self.kernel);
        info!("  Hostname: {}", self.hostname);
        info!("  CPU: {} x {}", self.cpu_count, self.cpu_brand);
        info!("  Memory: {} MB", self.total_memory_mb);
    }
}

/// Detect the graphical session type
///
/// Pointer injection behaves differently under Wayland and X11, so the
/// session type is the first thing to check when moves land wrong.
pub fn detect_session_type() -> Option<String> {
    if let Ok(session) = std::env::var("XDG_SESSION_TYPE") {
        return Some(session);
    }

    if std::env::var("WAYLAND_DISPLAY").is_ok() {
        return Some("wayland".to_string());
    }
    if std::env::var("DISPLAY").is_ok() {
        return Some("x11".to_string());
    }

    None
}

/// Log attached serial devices
fn log_serial_ports() {
    match serialport::available_ports() {
        Ok(ports) if ports.is_empty() => {
            info!("  Serial devices: none attached");
        }
        Ok(ports) => {
            info!("  Serial devices: {}", ports.len());
            for port in ports {
                info!("    {}", port.port_name);
            }
        }
        Err(e) => {
            info!("  Serial devices: enumeration failed ({})", e);
        }
    }
}

/// Log complete diagnostics on startup
pub fn log_startup_diagnostics() {
    info!("╔════════════════════════════════════════════════════════════╗");
    info!("║          Startup Diagnostics                              ║");
    info!("╚════════════════════════════════════════════════════════════╝");

    SystemInfo::gather().log();

    info!("=== Environment ===");
    if let Some(session) = detect_session_type() {
        info!("  Session type: {}", session);
    } else {
        info!("  Session type: Unknown (no graphical session?)");
    }
    log_serial_ports();

    info!("=== Tracker Build ===");
    info!("  Version: {}", env!("CARGO_PKG_VERSION"));
    #[cfg(debug_assertions)]
    info!("  Profile: debug");
    #[cfg(not(debug_assertions))]
    info!("  Profile: release");

    info!("╚════════════════════════════════════════════════════════════╝");
}
