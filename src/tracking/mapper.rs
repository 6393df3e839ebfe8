//! Camera-to-Screen Coordinate Mapping
//!
//! Maps bright-spot pixel coordinates into screen space. A configurable
//! safety margin trims the camera edges (where lens distortion and partial
//! occlusion make detections unreliable) and the remaining rectangle is
//! stretched linearly over the full screen.
//!
//! The map deliberately extrapolates outside the trimmed rectangle instead
//! of saturating: bounding the final cursor is the output clamp's job, and
//! saturating here would flatten displacement measurements near the edges.

use crate::tracking::error::{Result, TrackingError};
use crate::tracking::{ScreenPoint, ScreenSize};

/// Linear camera-to-screen mapper for one frame geometry
#[derive(Debug, Clone, Copy)]
pub struct CameraMapper {
    x_min: f64,
    y_min: f64,
    x_span: f64,
    y_span: f64,
    screen_max_x: f64,
    screen_max_y: f64,
}

impl CameraMapper {
    /// Build a mapper for the given camera dimensions and safety margin
    ///
    /// `margin` is the fraction of each edge to trim, expected in
    /// `[0.0, 0.4]` (config validation enforces the range). A camera
    /// dimension of zero collapses the trimmed span and is rejected.
    pub fn new(cam_width: u32, cam_height: u32, margin: f64, screen: ScreenSize) -> Result<Self> {
        let cam_w = cam_width as f64;
        let cam_h = cam_height as f64;

        let x_min = cam_w * margin;
        let x_max = cam_w * (1.0 - margin);
        let y_min = cam_h * margin;
        let y_max = cam_h * (1.0 - margin);

        let x_span = x_max - x_min;
        let y_span = y_max - y_min;

        if x_span <= 0.0 {
            return Err(TrackingError::DegenerateRange { axis: "x" });
        }
        if y_span <= 0.0 {
            return Err(TrackingError::DegenerateRange { axis: "y" });
        }

        Ok(Self {
            x_min,
            y_min,
            x_span,
            y_span,
            screen_max_x: screen.max_x(),
            screen_max_y: screen.max_y(),
        })
    }

    /// Map a camera pixel to screen space
    ///
    /// `[x_min, x_max]` maps onto `[0, screen_width - 1]` (same for y);
    /// inputs outside the trimmed rectangle extrapolate past the screen
    /// range and are left for the output clamp.
    pub fn to_screen(&self, px: u32, py: u32) -> ScreenPoint {
        let x = (px as f64 - self.x_min) / self.x_span * self.screen_max_x;
        let y = (py as f64 - self.y_min) / self.y_span * self.screen_max_y;
        ScreenPoint::new(x, y)
    }
}
