//! Frame Acquisition
//!
//! The estimator loop consumes grayscale frames through the [`FrameSource`]
//! trait and treats acquisition failure as fatal: a dead camera ends the
//! run. Real capture backends (V4L2, platform SDKs) plug in here; the crate
//! ships a deterministic synthetic scene used by the default binary
//! profile, demos and the integration tests.

use std::f64::consts::TAU;
use std::time::{Duration, Instant};

use thiserror::Error;

use crate::tracking::IntensityField;

/// Result type for capture operations
pub type Result<T> = std::result::Result<T, CaptureError>;

/// Frame acquisition error types
#[derive(Error, Debug)]
pub enum CaptureError {
    /// The device stopped delivering frames
    #[error("Frame source closed: {0}")]
    SourceClosed(String),

    /// Device-level I/O failure
    #[error("Frame source I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A blocking producer of grayscale frames
///
/// `next_frame` blocks until the next frame is due; the source's cadence is
/// what paces the estimator loop. Errors are fatal to the run.
pub trait FrameSource: Send {
    /// Acquire the next frame
    fn next_frame(&mut self) -> Result<IntensityField>;

    /// Frame dimensions (width, height)
    fn dimensions(&self) -> (u32, u32);
}

/// Synthetic test scene: a bright dot orbiting over a dim background
///
/// Deterministic frame for frame, so demo runs and integration tests see
/// identical sequences. The dot follows an ellipse inside the margin-safe
/// region; optional dropout windows blank it periodically to exercise the
/// no-target and dead-reckoning paths.
#[derive(Debug, Clone)]
pub struct SyntheticScene {
    width: u32,
    height: u32,
    /// Frames per second; zero or negative disables pacing (tests)
    fps: f64,
    /// Full orbits per second
    orbit_hz: f64,
    /// Dot radius in pixels
    dot_radius: f64,
    /// Peak dot intensity
    dot_intensity: u8,
    /// Background level
    background: u8,
    /// Every `dropout_period` frames the dot disappears... (0 disables)
    dropout_period: u32,
    /// ...for this many frames
    dropout_length: u32,
    frame_index: u64,
    next_deadline: Option<Instant>,
}

impl SyntheticScene {
    /// Create a scene with the given geometry and pacing
    pub fn new(width: u32, height: u32, fps: f64) -> Self {
        Self {
            width,
            height,
            fps,
            orbit_hz: 0.2,
            dot_radius: 4.0,
            dot_intensity: 255,
            background: 12,
            dropout_period: 0,
            dropout_length: 0,
            frame_index: 0,
            next_deadline: None,
        }
    }

    /// Blank the dot for `length` frames out of every `period`
    pub fn with_dropout(mut self, period: u32, length: u32) -> Self {
        self.dropout_period = period;
        self.dropout_length = length;
        self
    }

    /// Set orbit speed in full revolutions per second
    pub fn with_orbit_hz(mut self, orbit_hz: f64) -> Self {
        self.orbit_hz = orbit_hz;
        self
    }

    /// Dot center for a given frame index
    fn dot_center(&self, frame_index: u64) -> (f64, f64) {
        let fps = if self.fps > 0.0 { self.fps } else { 30.0 };
        let t = frame_index as f64 / fps;
        let angle = TAU * self.orbit_hz * t;

        // Orbit stays inside the central 60% so a 0.1..0.2 safety margin
        // never trims the dot away.
        let cx = self.width as f64 / 2.0;
        let cy = self.height as f64 / 2.0;
        (
            cx + angle.cos() * self.width as f64 * 0.3,
            cy + angle.sin() * self.height as f64 * 0.3,
        )
    }

    fn in_dropout(&self, frame_index: u64) -> bool {
        if self.dropout_period == 0 || self.dropout_length == 0 {
            return false;
        }
        (frame_index % self.dropout_period as u64) < self.dropout_length as u64
    }

    fn render(&self, frame_index: u64) -> IntensityField {
        let background = self.background;

        if self.in_dropout(frame_index) {
            return IntensityField::from_fn(self.width, self.height, |_, _| background);
        }

        let (dot_x, dot_y) = self.dot_center(frame_index);
        let radius = self.dot_radius;
        let peak = self.dot_intensity as f64;

        IntensityField::from_fn(self.width, self.height, |x, y| {
            let dx = x as f64 - dot_x;
            let dy = y as f64 - dot_y;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist <= radius {
                // Linear falloff from the peak to the background level.
                let level = peak - (peak - background as f64) * (dist / radius) * 0.5;
                level as u8
            } else {
                background
            }
        })
    }

    fn pace(&mut self) {
        if self.fps <= 0.0 {
            return;
        }
        let interval = Duration::from_secs_f64(1.0 / self.fps);
        let now = Instant::now();
        let deadline = self.next_deadline.unwrap_or(now);

        if deadline > now {
            std::thread::sleep(deadline - now);
        }
        // Schedule from the deadline, not from wake-up, so drift does not
        // accumulate; a long stall resets the schedule instead of bursting.
        let base = if now > deadline + interval {
            now
        } else {
            deadline
        };
        self.next_deadline = Some(base + interval);
    }
}

impl FrameSource for SyntheticScene {
    fn next_frame(&mut self) -> Result<IntensityField> {
        self.pace();
        let frame = self.render(self.frame_index);
        self.frame_index += 1;
        Ok(frame)
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracking::find_bright_spot;

    #[test]
    fn test_scene_is_deterministic() {
        let mut a = SyntheticScene::new(64, 48, 0.0);
        let mut b = SyntheticScene::new(64, 48, 0.0);

        for _ in 0..10 {
            assert_eq!(a.next_frame().unwrap(), b.next_frame().unwrap());
        }
    }

    #[test]
    fn test_dot_is_trackable() {
        let mut scene = SyntheticScene::new(64, 48, 0.0);
        let frame = scene.next_frame().unwrap();
        let obs = find_bright_spot(&frame, 200).unwrap();
        assert!(obs.valid);
    }

    #[test]
    fn test_dot_moves_over_time() {
        let mut scene = SyntheticScene::new(64, 48, 0.0).with_orbit_hz(1.0);
        let first = find_bright_spot(&scene.next_frame().unwrap(), 200).unwrap();
        for _ in 0..10 {
            scene.next_frame().unwrap();
        }
        let later = find_bright_spot(&scene.next_frame().unwrap(), 200).unwrap();
        assert_ne!(first.pixel, later.pixel);
    }

    #[test]
    fn test_dropout_blanks_the_dot() {
        let mut scene = SyntheticScene::new(64, 48, 0.0).with_dropout(10, 3);

        // Frames 0..3 are blanked, 3..10 carry the dot.
        let obs = find_bright_spot(&scene.next_frame().unwrap(), 200).unwrap();
        assert!(!obs.valid);

        for _ in 0..2 {
            scene.next_frame().unwrap();
        }
        let obs = find_bright_spot(&scene.next_frame().unwrap(), 200).unwrap();
        assert!(obs.valid);
    }

    #[test]
    fn test_dot_stays_inside_margin_region() {
        let mut scene = SyntheticScene::new(640, 480, 0.0).with_orbit_hz(0.37);
        for _ in 0..200 {
            let frame = scene.next_frame().unwrap();
            let obs = find_bright_spot(&frame, 200).unwrap();
            let (x, y) = obs.pixel;
            // Margin 0.2 trims to [128, 512] x [96, 384].
            assert!(x >= 128 && x <= 512, "x = {x}");
            assert!(y >= 96 && y <= 384, "y = {y}");
        }
    }
}
