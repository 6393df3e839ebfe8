//! glowtrack - Adaptive Sensor-Fusion Cursor Tracker
//!
//! Entry point for the tracker binary.

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use glowtrack::capture::SyntheticScene;
use glowtrack::config::Config;
use glowtrack::pointer::TracingPointer;
use glowtrack::relay::RelayService;
use glowtrack::runtime::{SharedControls, TrackerRuntime};
use glowtrack::serial::SerialLink;
use glowtrack::utils::format_user_error;

/// Command-line arguments for glowtrack
#[derive(Parser, Debug)]
#[command(name = "glowtrack")]
#[command(version, about = "Adaptive sensor-fusion cursor tracker", long_about = None)]
pub struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "glowtrack.toml")]
    pub config: String,

    /// Click relay listen address
    #[arg(short, long, env = "GLOWTRACK_LISTEN")]
    pub listen: Option<String>,

    /// Serial port of the IMU device ("auto" to discover)
    #[arg(short = 'p', long, env = "GLOWTRACK_SERIAL_PORT")]
    pub serial_port: Option<String>,

    /// Run camera-only, without opening the IMU link
    #[arg(long)]
    pub no_imu: bool,

    /// Start with tracking paused
    #[arg(long)]
    pub start_paused: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log output format: pretty, compact or json
    #[arg(long, default_value = "pretty")]
    pub log_format: String,

    /// Also write logs to this file
    #[arg(long)]
    pub log_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging (guard must outlive main for the file writer)
    let _log_guard = init_logging(&args)?;

    info!("════════════════════════════════════════════════════════");
    info!("  glowtrack v{}", env!("CARGO_PKG_VERSION"));
    info!("  Built: {} {}", env!("BUILD_DATE"), env!("BUILD_TIME"));
    info!("  Commit: {}", env!("GIT_HASH"));
    info!("  Profile: {}", if cfg!(debug_assertions) { "debug" } else { "release" });
    info!("════════════════════════════════════════════════════════");

    glowtrack::utils::log_startup_diagnostics();

    if let Err(e) = run(args).await {
        eprintln!("{}", format_user_error(&e));
        return Err(e);
    }

    info!("glowtrack shut down");
    Ok(())
}

async fn run(args: Args) -> Result<()> {
    let config = Config::load_or_default(&args.config)?
        .with_overrides(args.listen.clone(), args.serial_port.clone(), args.no_imu);

    info!(
        "Configuration loaded: screen {}x{}, camera {}x{}, imu {}",
        config.screen.width,
        config.screen.height,
        config.camera.width,
        config.camera.height,
        if config.imu.enabled { "enabled" } else { "disabled" }
    );
    tracing::debug!("Config: {:?}", config);

    let relay_listen: SocketAddr = config
        .relay
        .listen
        .parse()
        .context("Invalid relay listen address")?;

    // Open the IMU link; tracking degrades to camera-only if it fails
    let serial = if config.imu.enabled {
        let port = config.imu.port.clone();
        let baud = config.imu.baud;
        let opened = tokio::task::spawn_blocking(move || SerialLink::open(&port, baud))
            .await
            .context("IMU link task failed")?;

        match opened {
            Ok(link) => Some(Arc::new(Mutex::new(link))),
            Err(e) => {
                warn!("IMU link unavailable, tracking camera-only: {}", e);
                None
            }
        }
    } else {
        info!("IMU link disabled, tracking camera-only");
        None
    };

    let mut controls = config.tick_controls();
    controls.paused = args.start_paused;
    let shared = SharedControls::new(controls);

    // The synthetic scene stands in for a camera: a bright dot orbiting the
    // frame at the configured resolution and pace.
    let source = Box::new(SyntheticScene::new(
        config.camera.width,
        config.camera.height,
        config.camera.fps,
    ));

    info!("Starting tracker");
    let mut runtime = TrackerRuntime::spawn(
        &config,
        source,
        Box::new(TracingPointer),
        serial.clone(),
        shared.clone(),
    )
    .context("Failed to start tracker thread")?;

    let relay = if config.relay.enabled {
        let service = RelayService::new(relay_listen, serial.clone(), runtime.status());
        Some(service.start().await?)
    } else {
        info!("Click relay disabled");
        None
    };

    if args.start_paused {
        info!("Tracking starts paused; resume via the controls");
    }
    info!("Tracker running; press Ctrl-C to stop");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl-C received, shutting down");
        }
        _ = tracker_exited(&runtime) => {
            warn!("Tracker loop ended on its own, shutting down");
        }
    }

    // Frame source and serial close inside the tracker thread; the relay
    // goes down last so a queued click can still reach the device.
    runtime.shutdown();
    if let Some(handle) = relay {
        handle.shutdown().await;
    }

    Ok(())
}

/// Resolve once the tracker thread is no longer running
async fn tracker_exited(runtime: &TrackerRuntime) {
    while runtime.is_running() {
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}

fn init_logging(args: &Args) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    use std::fs::File;

    let log_level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        // Tracker crates at the requested level; per-tick trace spam stays
        // opt-in via RUST_LOG.
        tracing_subscriber::EnvFilter::new(format!("glowtrack={level},warn", level = log_level))
    });

    // File logging adds a second sink next to stdout
    if let Some(log_file_path) = &args.log_file {
        let file = File::create(log_file_path)?;
        let (writer, guard) = tracing_appender::non_blocking(file);

        match args.log_format.as_str() {
            "json" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(std::io::stdout),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(writer)
                            .with_ansi(false),
                    )
                    .init();
            }
            "compact" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_writer(std::io::stdout),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_writer(writer)
                            .with_ansi(false),
                    )
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .pretty()
                            .with_writer(std::io::stdout),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .with_writer(writer)
                            .with_ansi(false),
                    )
                    .init();
            }
        }
        info!("Logging to file: {}", log_file_path);
        return Ok(Some(guard));
    }

    // Stdout only
    match args.log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        "compact" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().compact())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(None)
}
