//! # glowtrack
//!
//! Adaptive sensor-fusion cursor tracker. A camera watches for a bright
//! marker (an IR LED on a headset or handheld wand), an IMU streams motion
//! records over serial, and every tick the two are fused into one smoothed,
//! clamped screen-cursor position.
//!
//! # Architecture
//!
//! ```text
//! glowtrack
//!   ├─> Frame Source (camera frames as intensity fields)
//!   ├─> Serial Link (raw IMU records from the handheld device)
//!   ├─> Cursor Estimator (locate → map → decode → arbitrate → fuse → clamp)
//!   ├─> Pointer Sink (where the fused position goes)
//!   └─> Click Relay (HTTP remote for click commands + status)
//! ```
//!
//! # Data Flow
//!
//! **Tracking Path:** Frame Source + Serial Link → Cursor Estimator → Pointer Sink
//!
//! **Control Path:** Click Relay → Serial Link → device buttons
//!
//! The estimator is deliberately free of I/O: it consumes one intensity
//! field and at most one raw IMU record per tick and returns where the
//! cursor should be, which keeps every fusion decision unit-testable. The
//! [`runtime`] module owns the thread that feeds it; [`relay`] exposes the
//! phone-facing HTTP surface.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Frame acquisition (frame source trait and the synthetic test scene)
pub mod capture;

/// Tracker configuration
pub mod config;

/// Pointer sinks (where fused cursor positions are delivered)
pub mod pointer;

/// Click relay HTTP service
pub mod relay;

/// Tracker runtime (the per-frame loop and its shared state)
pub mod runtime;

/// Serial IMU link
pub mod serial;

/// Core estimation pipeline
///
/// Bright-spot location, camera-to-screen mapping, IMU record decoding,
/// mode arbitration, fusion filtering and output clamping. Everything in
/// here is pure state-machine code with no device I/O.
pub mod tracking;

/// Diagnostics and user-facing error formatting
pub mod utils;

pub use capture::{FrameSource, SyntheticScene};
pub use config::Config;
pub use pointer::PointerSink;
pub use tracking::{CursorEstimator, Mode, ScreenPoint, ScreenSize, TickControls, TickOutput};
