//! Tracking runtime
//!
//! Owns the dedicated thread that drives the estimator: one iteration per
//! camera frame, from frame acquisition through pointer movement and status
//! publication. The loop is plain blocking code on its own thread; the async
//! side (relay, signal handling) talks to it only through shared state:
//!
//! ```text
//! ┌──────────────┐   controls snapshot   ┌─────────────────┐
//! │ relay / CLI  │ ────────────────────► │ tracker thread  │
//! │ (tokio)      │ ◄──────────────────── │ (std::thread)   │
//! └──────────────┘    status snapshot    └─────────────────┘
//! ```

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::SystemTime;
use tracing::{debug, error, info, warn};

use crate::capture::FrameSource;
use crate::config::Config;
use crate::pointer::PointerSink;
use crate::serial::SerialLink;
use crate::tracking::{CursorEstimator, Mode, TickControls};

/// Live tunables shared between the tracker thread and its controllers
///
/// Readers take a full [`TickControls`] snapshot once per tick, so a write
/// can never tear a single pipeline pass.
#[derive(Debug, Clone)]
pub struct SharedControls {
    inner: Arc<RwLock<TickControls>>,
}

impl SharedControls {
    /// Wrap an initial set of controls
    pub fn new(controls: TickControls) -> Self {
        Self {
            inner: Arc::new(RwLock::new(controls)),
        }
    }

    /// Copy out the current controls
    pub fn snapshot(&self) -> TickControls {
        *self.inner.read()
    }

    /// Set the master pause flag
    pub fn set_paused(&self, paused: bool) {
        self.inner.write().paused = paused;
        info!("Tracking {}", if paused { "paused" } else { "resumed" });
    }

    /// Flip the master pause flag, returning the new value
    pub fn toggle_paused(&self) -> bool {
        let mut guard = self.inner.write();
        guard.paused = !guard.paused;
        let paused = guard.paused;
        drop(guard);
        info!("Tracking {}", if paused { "paused" } else { "resumed" });
        paused
    }

    /// Apply an arbitrary mutation to the controls
    pub fn update(&self, f: impl FnOnce(&mut TickControls)) {
        f(&mut self.inner.write());
    }
}

/// Most recent tick result, published for the relay's status endpoint
#[derive(Debug, Clone, Copy, Serialize)]
pub struct StatusSnapshot {
    /// Ticks completed since startup
    pub tick: u64,
    /// Selected tracking mode
    pub mode: Mode,
    /// Human-readable mode label
    pub label: &'static str,
    /// Indicator color for the mode
    pub color: &'static str,
    /// Pointer target x, absent while paused
    pub x: Option<f64>,
    /// Pointer target y, absent while paused
    pub y: Option<f64>,
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        let mode = Mode::NoTarget;
        Self {
            tick: 0,
            mode,
            label: mode.label(),
            color: mode.color(),
            x: None,
            y: None,
        }
    }
}

/// Shared cell holding the latest [`StatusSnapshot`]
pub type StatusCell = Arc<RwLock<StatusSnapshot>>;

/// Tracker loop statistics
#[derive(Debug)]
pub struct RuntimeStats {
    /// Total ticks processed
    pub ticks: AtomicU64,
    /// Ticks that selected camera tracking
    pub camera_ticks: AtomicU64,
    /// Ticks that selected noise suppression
    pub suppressed_ticks: AtomicU64,
    /// Ticks that selected dead-reckoning prediction
    pub imu_ticks: AtomicU64,
    /// Ticks with no usable input
    pub no_target_ticks: AtomicU64,
    /// Serial records dropped by the decoder
    pub malformed_records: AtomicU64,
    /// Pointer moves issued
    pub pointer_moves: AtomicU64,
    /// Loop start time
    pub start_time: SystemTime,
}

impl RuntimeStats {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            ticks: AtomicU64::new(0),
            camera_ticks: AtomicU64::new(0),
            suppressed_ticks: AtomicU64::new(0),
            imu_ticks: AtomicU64::new(0),
            no_target_ticks: AtomicU64::new(0),
            malformed_records: AtomicU64::new(0),
            pointer_moves: AtomicU64::new(0),
            start_time: SystemTime::now(),
        })
    }

    fn record_mode(&self, mode: Mode) {
        let counter = match mode {
            Mode::CameraNormal => &self.camera_ticks,
            Mode::CameraNoiseSuppressed => &self.suppressed_ticks,
            Mode::ImuPrediction => &self.imu_ticks,
            Mode::NoTarget => &self.no_target_ticks,
            Mode::Idle => return,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Handle to the running tracker thread
pub struct TrackerRuntime {
    thread_handle: Option<JoinHandle<()>>,
    stop: Arc<AtomicBool>,
    controls: SharedControls,
    status: StatusCell,
    stats: Arc<RuntimeStats>,
}

impl TrackerRuntime {
    /// Spawn the tracker loop on a dedicated thread
    ///
    /// Takes ownership of the frame source and pointer sink; the serial link
    /// stays shared so the relay can write click commands to it.
    pub fn spawn(
        config: &Config,
        source: Box<dyn FrameSource>,
        pointer: Box<dyn PointerSink>,
        serial: Option<Arc<Mutex<SerialLink>>>,
        controls: SharedControls,
    ) -> std::io::Result<Self> {
        let status: StatusCell = Arc::new(RwLock::new(StatusSnapshot::default()));
        let stats = RuntimeStats::new();
        let stop = Arc::new(AtomicBool::new(false));

        let estimator = CursorEstimator::new(config.screen_size());
        let mirror = config.camera.mirror;

        let thread_handle = thread::Builder::new().name("tracker-loop".to_string()).spawn({
            let controls = controls.clone();
            let status = Arc::clone(&status);
            let stats = Arc::clone(&stats);
            let stop = Arc::clone(&stop);
            move || {
                run_tracker_loop(
                    estimator, source, pointer, serial, mirror, controls, status, stats, stop,
                );
            }
        })?;

        info!("Tracker thread started");

        Ok(Self {
            thread_handle: Some(thread_handle),
            stop,
            controls,
            status,
            stats,
        })
    }

    /// Shared status cell for the relay
    pub fn status(&self) -> StatusCell {
        Arc::clone(&self.status)
    }

    /// Shared controls handle
    pub fn controls(&self) -> SharedControls {
        self.controls.clone()
    }

    /// Loop statistics
    pub fn stats(&self) -> Arc<RuntimeStats> {
        Arc::clone(&self.stats)
    }

    /// True while the tracker thread is alive
    pub fn is_running(&self) -> bool {
        self.thread_handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stop the tracker thread and wait for it to exit
    pub fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);

        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                error!("Tracker thread panicked during shutdown");
                return;
            }
        }

        let stats = &self.stats;
        info!(
            ticks = stats.ticks.load(Ordering::Relaxed),
            camera = stats.camera_ticks.load(Ordering::Relaxed),
            suppressed = stats.suppressed_ticks.load(Ordering::Relaxed),
            imu = stats.imu_ticks.load(Ordering::Relaxed),
            no_target = stats.no_target_ticks.load(Ordering::Relaxed),
            malformed = stats.malformed_records.load(Ordering::Relaxed),
            moves = stats.pointer_moves.load(Ordering::Relaxed),
            "Tracker thread stopped"
        );
    }
}

impl Drop for TrackerRuntime {
    fn drop(&mut self) {
        debug!("Dropping TrackerRuntime");
        self.shutdown();
    }
}

/// Loop body running on the tracker thread
///
/// Per iteration: snapshot controls, fold serial health into `imu_active`,
/// pull a frame, poll the serial link, run one estimator tick, move the
/// pointer, publish status. A frame source error ends the loop; everything
/// else degrades and keeps ticking.
#[allow(clippy::too_many_arguments)]
fn run_tracker_loop(
    mut estimator: CursorEstimator,
    mut source: Box<dyn FrameSource>,
    mut pointer: Box<dyn PointerSink>,
    serial: Option<Arc<Mutex<SerialLink>>>,
    mirror: bool,
    controls: SharedControls,
    status: StatusCell,
    stats: Arc<RuntimeStats>,
    stop: Arc<AtomicBool>,
) {
    let (frame_w, frame_h) = source.dimensions();
    info!("Tracker loop running ({}x{} frames)", frame_w, frame_h);
    let mut last_mode: Option<Mode> = None;

    while !stop.load(Ordering::Relaxed) {
        let mut ctl: TickControls = controls.snapshot();

        // Configured intent only counts while the link is actually alive.
        if ctl.imu_active {
            let link_healthy = serial
                .as_ref()
                .is_some_and(|link| link.lock().is_healthy());
            ctl.imu_active = link_healthy;
        }

        let mut field = match source.next_frame() {
            Ok(field) => field,
            Err(e) => {
                error!("Frame source failed: {}", e);
                break;
            }
        };
        if mirror {
            field.mirror_rows();
        }

        let record = if ctl.imu_active {
            serial.as_ref().and_then(|link| link.lock().poll_record())
        } else {
            None
        };
        let record_present = record.is_some();

        let output = match estimator.tick(&field, record.as_deref(), &ctl) {
            Ok(output) => output,
            Err(e) => {
                error!("Estimator tick failed: {}", e);
                break;
            }
        };

        if record_present && !output.record_decoded {
            stats.malformed_records.fetch_add(1, Ordering::Relaxed);
        }

        if let Some(target) = output.pointer {
            pointer.move_to(target);
            stats.pointer_moves.fetch_add(1, Ordering::Relaxed);
        }

        stats.ticks.fetch_add(1, Ordering::Relaxed);
        stats.record_mode(output.mode);

        if last_mode != Some(output.mode) {
            info!(
                mode = output.mode.label(),
                color = output.mode.color(),
                "Tracking mode changed"
            );
            last_mode = Some(output.mode);
        }

        let tick = stats.ticks.load(Ordering::Relaxed);
        *status.write() = StatusSnapshot {
            tick,
            mode: output.mode,
            label: output.mode.label(),
            color: output.mode.color(),
            x: output.pointer.map(|p| p.x),
            y: output.pointer.map(|p| p.y),
        };
    }

    drop(source);
    if let Some(link) = serial {
        link.lock().close();
    }
    info!("Tracker loop exited");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::SyntheticScene;
    use crate::pointer::NullPointer;
    use std::time::Duration;

    fn test_config() -> Config {
        let mut config = Config::default();
        // Unpaced source and no hardware for tests
        config.camera.fps = 0.0;
        config.imu.enabled = false;
        config
    }

    #[test]
    fn test_spawn_and_shutdown() {
        let config = test_config();
        let source = Box::new(SyntheticScene::new(
            config.camera.width,
            config.camera.height,
            config.camera.fps,
        ));
        let controls = SharedControls::new(config.tick_controls());

        let mut runtime = TrackerRuntime::spawn(
            &config,
            source,
            Box::new(NullPointer),
            None,
            controls,
        )
        .unwrap();

        // Let the unpaced loop spin for a bit.
        std::thread::sleep(Duration::from_millis(50));
        assert!(runtime.is_running());

        runtime.shutdown();
        assert!(!runtime.is_running());

        let stats = runtime.stats();
        assert!(stats.ticks.load(Ordering::Relaxed) > 0);
        assert!(stats.pointer_moves.load(Ordering::Relaxed) > 0);
    }

    #[test]
    fn test_status_publishes_camera_mode() {
        let config = test_config();
        let source = Box::new(SyntheticScene::new(
            config.camera.width,
            config.camera.height,
            config.camera.fps,
        ));
        let controls = SharedControls::new(config.tick_controls());

        let mut runtime = TrackerRuntime::spawn(
            &config,
            source,
            Box::new(NullPointer),
            None,
            controls,
        )
        .unwrap();

        std::thread::sleep(Duration::from_millis(50));
        let snapshot = *runtime.status().read();
        runtime.shutdown();

        assert!(snapshot.tick > 0);
        assert_eq!(snapshot.mode, Mode::CameraNormal);
        assert!(snapshot.x.is_some());
    }

    #[test]
    fn test_pause_stops_pointer_moves() {
        let config = test_config();
        let source = Box::new(SyntheticScene::new(
            config.camera.width,
            config.camera.height,
            config.camera.fps,
        ));
        let controls = SharedControls::new(config.tick_controls());
        controls.set_paused(true);

        let mut runtime = TrackerRuntime::spawn(
            &config,
            source,
            Box::new(NullPointer),
            None,
            controls.clone(),
        )
        .unwrap();

        std::thread::sleep(Duration::from_millis(50));
        let snapshot = *runtime.status().read();
        runtime.shutdown();

        assert_eq!(snapshot.mode, Mode::Idle);
        assert!(snapshot.x.is_none());
        assert_eq!(runtime.stats().pointer_moves.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_toggle_paused() {
        let controls = SharedControls::new(TickControls::default());
        assert!(!controls.snapshot().paused);
        assert!(controls.toggle_paused());
        assert!(controls.snapshot().paused);
        assert!(!controls.toggle_paused());
        assert!(!controls.snapshot().paused);
    }
}
