//! Fusion Filter
//!
//! Owns the fused cursor estimate and moves it according to the arbitrated
//! mode:
//!
//! ```text
//! ImuPrediction:          fused += (dx * sens_x, dy * sens_y)
//! CameraNormal:           fused = (1 - α_normal) * fused + α_normal * camera
//! CameraNoiseSuppressed:  fused = (1 - α_stationary) * fused + α_stationary * camera
//! Idle, NoTarget:         hold
//! ```
//!
//! The stationary blend factor is much smaller than the normal one, so a
//! jittering but physically still target barely disturbs the cursor.

use crate::tracking::arbiter::Mode;
use crate::tracking::decoder::ImuDelta;
use crate::tracking::{ScreenPoint, ScreenSize, TickControls};

/// Fused cursor estimate plus the previous camera point
///
/// Exactly one estimator owns this; nothing else writes it. `last_camera`
/// remembers where the camera last put the target (mapped when valid, held
/// when not) and feeds the displacement measurement on the next tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionState {
    fused: ScreenPoint,
    last_camera: ScreenPoint,
}

impl FusionState {
    /// Start both points at the screen center
    pub fn centered(screen: ScreenSize) -> Self {
        let center = screen.center();
        Self {
            fused: center,
            last_camera: center,
        }
    }

    /// Current fused estimate
    pub fn fused(&self) -> ScreenPoint {
        self.fused
    }

    /// Camera point recorded at the end of the previous tick
    pub fn last_camera(&self) -> ScreenPoint {
        self.last_camera
    }

    /// Apply one tick's update for the arbitrated mode
    pub fn apply(&mut self, mode: Mode, camera: ScreenPoint, delta: ImuDelta, ctl: &TickControls) {
        match mode {
            Mode::ImuPrediction => {
                self.fused.x += delta.dx * ctl.sensitivity_x;
                self.fused.y += delta.dy * ctl.sensitivity_y;
            }
            Mode::CameraNormal => self.blend(camera, ctl.alpha_normal),
            Mode::CameraNoiseSuppressed => self.blend(camera, ctl.alpha_stationary),
            Mode::Idle | Mode::NoTarget => {}
        }
    }

    /// Clamp the fused estimate into the screen rectangle and return it
    ///
    /// Writing the clamp back keeps the estimate inside the screen even
    /// after a long dead-reckoning run toward an edge, so recovery starts
    /// from the boundary rather than from far off-screen.
    pub fn clamp_fused(&mut self, screen: ScreenSize) -> ScreenPoint {
        self.fused = self.fused.clamp_to(screen);
        self.fused
    }

    /// Record this tick's camera point for next tick's displacement
    pub fn set_last_camera(&mut self, camera: ScreenPoint) {
        self.last_camera = camera;
    }

    /// Re-center both points (new screen geometry or an explicit recenter)
    pub fn recenter(&mut self, screen: ScreenSize) {
        let center = screen.center();
        self.fused = center;
        self.last_camera = center;
    }

    fn blend(&mut self, target: ScreenPoint, alpha: f64) {
        self.fused.x = (1.0 - alpha) * self.fused.x + alpha * target.x;
        self.fused.y = (1.0 - alpha) * self.fused.y + alpha * target.y;
    }
}
