//! Sensor-Fusion Tracking Pipeline
//!
//! Per-tick estimator that fuses a camera bright-spot observation with IMU
//! motion data into a single clamped screen cursor position plus a mode label
//! describing which sensor drove the update.
//!
//! # Pipeline
//!
//! ```text
//! IntensityField
//!       ↓
//! ┌───────────────────┐
//! │ Bright-Spot Scan  │ → FrameObservation (pixel, intensity, valid)
//! └───────────────────┘
//!       ↓
//! ┌───────────────────┐
//! │ Camera Mapper     │ → camera ScreenPoint (margin-trimmed linear map)
//! └───────────────────┘
//!       ↓
//! raw IMU record → ┌────────────────┐
//!                  │ Record Decoder │ → ImuDelta (dx, dy, moving)
//!                  └────────────────┘
//!       ↓
//! ┌───────────────────┐
//! │ Mode Arbiter      │ → Mode (pure decision table, re-derived each tick)
//! └───────────────────┘
//!       ↓
//! ┌───────────────────┐
//! │ Fusion Filter     │ → updated FusionState
//! └───────────────────┘
//!       ↓
//! ┌───────────────────┐
//! │ Output Clamp      │ → final pointer target inside the screen rectangle
//! └───────────────────┘
//! ```
//!
//! The estimator owns all pipeline state ([`FusionState`] plus decoder
//! history) and exposes exactly one entry point per frame:
//! [`CursorEstimator::tick`]. Tunables arrive as a [`TickControls`] snapshot
//! taken fresh at the top of every tick, so a mid-tick settings change can
//! never tear a single update.

use serde::Serialize;

pub mod arbiter;
pub mod decoder;
pub mod error;
pub mod estimator;
pub mod field;
pub mod filter;
pub mod mapper;

pub use arbiter::{select_mode, ArbiterInput, Mode};
pub use decoder::{ImuDelta, RecordDecoder};
pub use error::{Result, TrackingError};
pub use estimator::{CursorEstimator, TickOutput};
pub use field::{find_bright_spot, FrameObservation, IntensityField};
pub use filter::FusionState;
pub use mapper::CameraMapper;

/// A position in screen space
///
/// Components are kept as `f64` through the whole pipeline; rounding to
/// integer pixels is the pointer sink's business.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreenPoint {
    /// Horizontal position (pixels, 0 at the left edge)
    pub x: f64,
    /// Vertical position (pixels, 0 at the top edge)
    pub y: f64,
}

impl ScreenPoint {
    /// Create a new screen point
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point
    pub fn distance_to(&self, other: ScreenPoint) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Clamp componentwise into the screen rectangle
    ///
    /// Idempotent: clamping a clamped point is a no-op.
    pub fn clamp_to(&self, screen: ScreenSize) -> ScreenPoint {
        ScreenPoint {
            x: self.x.max(0.0).min(screen.max_x()),
            y: self.y.max(0.0).min(screen.max_y()),
        }
    }
}

/// Target screen dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScreenSize {
    /// Screen width in pixels
    pub width: u32,
    /// Screen height in pixels
    pub height: u32,
}

impl ScreenSize {
    /// Create a new screen size
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Largest valid x coordinate
    pub fn max_x(&self) -> f64 {
        self.width.saturating_sub(1) as f64
    }

    /// Largest valid y coordinate
    pub fn max_y(&self) -> f64 {
        self.height.saturating_sub(1) as f64
    }

    /// Screen center point
    pub fn center(&self) -> ScreenPoint {
        ScreenPoint::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }
}

/// Tunable parameters consumed by one estimator tick
///
/// The runtime snapshots its shared controls into this struct at the top of
/// every tick. Defaults match the shipped configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickControls {
    /// Master pause: forces `Idle`, no state update, no pointer output
    pub paused: bool,
    /// IMU fusion requested and a live link is attached
    pub imu_active: bool,
    /// Camera-only noise suppression flag
    pub noise_suppression: bool,
    /// Minimum intensity for a bright spot to count as a target
    pub brightness_threshold: u8,
    /// Fraction of each camera edge excluded from the usable rectangle
    pub safety_margin: f64,
    /// Orientation deltas at or below this magnitude do not count as motion
    pub dead_zone: f64,
    /// Accelerations at or below this magnitude do not count as motion
    pub accel_threshold: f64,
    /// Camera displacement above this while the IMU is still is treated as noise
    pub cam_motion_threshold: f64,
    /// Camera blend factor in normal tracking
    pub alpha_normal: f64,
    /// Camera blend factor while noise suppression is active
    pub alpha_stationary: f64,
    /// Screen pixels per IMU delta unit, x axis
    pub sensitivity_x: f64,
    /// Screen pixels per IMU delta unit, y axis (negative inverts)
    pub sensitivity_y: f64,
}

impl Default for TickControls {
    fn default() -> Self {
        Self {
            paused: false,
            imu_active: false,
            noise_suppression: false,
            brightness_threshold: 200,
            safety_margin: 0.1,
            dead_zone: 0.5,
            accel_threshold: 0.5,
            cam_motion_threshold: 0.5,
            alpha_normal: 0.4,
            alpha_stationary: 0.1,
            sensitivity_x: 5.0,
            sensitivity_y: -10.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = ScreenPoint::new(0.0, 0.0);
        let b = ScreenPoint::new(3.0, 4.0);
        assert_eq!(a.distance_to(b), 5.0);
        assert_eq!(b.distance_to(a), 5.0);
    }

    #[test]
    fn test_clamp_inside_is_identity() {
        let screen = ScreenSize::new(1920, 1080);
        let p = ScreenPoint::new(960.0, 540.0);
        assert_eq!(p.clamp_to(screen), p);
    }

    #[test]
    fn test_clamp_idempotent() {
        let screen = ScreenSize::new(1920, 1080);
        let p = ScreenPoint::new(-250.0, 5000.0);
        let once = p.clamp_to(screen);
        assert_eq!(once, once.clamp_to(screen));
        assert_eq!(once, ScreenPoint::new(0.0, 1079.0));
    }

    #[test]
    fn test_center() {
        let screen = ScreenSize::new(1920, 1080);
        assert_eq!(screen.center(), ScreenPoint::new(960.0, 540.0));
    }
}
