//! Per-Tick Estimation
//!
//! [`CursorEstimator`] wires the pipeline stages together: locate the
//! bright spot, map it to screen space, decode the pending IMU record,
//! arbitrate a mode, update the fusion state and clamp the result. One call
//! per acquired frame; the estimator is the sole owner of all pipeline
//! state.

use tracing::trace;

use crate::tracking::arbiter::{select_mode, ArbiterInput, Mode};
use crate::tracking::decoder::RecordDecoder;
use crate::tracking::error::Result;
use crate::tracking::field::{find_bright_spot, FrameObservation, IntensityField};
use crate::tracking::filter::FusionState;
use crate::tracking::mapper::CameraMapper;
use crate::tracking::{ScreenPoint, ScreenSize, TickControls};

/// Result of one estimator tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOutput {
    /// Arbitrated mode for this tick
    pub mode: Mode,
    /// Bright-spot observation (reported even when invalid, for overlays)
    pub spot: FrameObservation,
    /// Pointer target; `None` exactly when the mode is `Idle`
    pub pointer: Option<ScreenPoint>,
    /// Whether this tick's raw IMU record decoded to a usable delta
    pub record_decoded: bool,
}

/// Sensor-fusion cursor estimator
///
/// Owns the fusion state and the IMU decoder history. Construct once per
/// run; feed it one frame (plus at most one raw IMU record) per tick.
pub struct CursorEstimator {
    screen: ScreenSize,
    state: FusionState,
    decoder: RecordDecoder,
}

impl CursorEstimator {
    /// Create an estimator centered on the given screen
    pub fn new(screen: ScreenSize) -> Self {
        Self {
            screen,
            state: FusionState::centered(screen),
            decoder: RecordDecoder::new(),
        }
    }

    /// Run one tick of the pipeline
    ///
    /// `record` is this tick's pending IMU line, if any. Tunables in `ctl`
    /// are a fresh snapshot; nothing is cached between ticks. Fails only on
    /// invalid input (broken field geometry), which callers treat as fatal.
    pub fn tick(
        &mut self,
        field: &IntensityField,
        record: Option<&str>,
        ctl: &TickControls,
    ) -> Result<TickOutput> {
        let spot = find_bright_spot(field, ctl.brightness_threshold)?;
        let mapper = CameraMapper::new(field.width(), field.height(), ctl.safety_margin, self.screen)?;

        // Invalid observation holds the previous camera point, so the
        // displacement measurement reads zero while the target is lost.
        let camera = if spot.valid {
            mapper.to_screen(spot.pixel.0, spot.pixel.1)
        } else {
            self.state.last_camera()
        };

        let decoded = record.and_then(|r| self.decoder.decode(r, ctl.dead_zone, ctl.accel_threshold));
        let record_decoded = decoded.is_some();
        let delta = decoded.unwrap_or_default();

        let mode = select_mode(&ArbiterInput {
            paused: ctl.paused,
            cam_valid: spot.valid,
            imu_active: ctl.imu_active,
            imu_moving: delta.moving,
            imu_delta_nonzero: delta.is_nonzero(),
            cam_displacement: camera.distance_to(self.state.last_camera()),
            cam_motion_threshold: ctl.cam_motion_threshold,
            noise_suppression: ctl.noise_suppression,
        });

        self.state.apply(mode, camera, delta, ctl);

        let pointer = if mode.is_active() {
            Some(self.state.clamp_fused(self.screen))
        } else {
            None
        };

        // Recorded every tick, pause included, so resuming does not see a
        // phantom displacement spike.
        self.state.set_last_camera(camera);

        trace!(
            mode = mode.label(),
            spot_valid = spot.valid,
            intensity = spot.intensity,
            fused_x = self.state.fused().x,
            fused_y = self.state.fused().y,
            "tick"
        );

        Ok(TickOutput {
            mode,
            spot,
            pointer,
            record_decoded,
        })
    }

    /// Current fusion state
    pub fn state(&self) -> &FusionState {
        &self.state
    }

    /// Screen geometry this estimator clamps to
    pub fn screen(&self) -> ScreenSize {
        self.screen
    }

    /// Forget IMU position history (serial link reconnected)
    pub fn reset_imu(&mut self) {
        self.decoder.reset();
    }

    /// Re-center the cursor estimate and drop all history
    pub fn reset(&mut self) {
        self.state.recenter(self.screen);
        self.decoder.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCREEN: ScreenSize = ScreenSize {
        width: 1920,
        height: 1080,
    };

    /// 64x48 all-dark field: below any reasonable threshold.
    fn dark_field() -> IntensityField {
        IntensityField::from_fn(64, 48, |_, _| 10)
    }

    /// Dark field with a saturated pixel at (x, y).
    fn field_with_spot(x: u32, y: u32) -> IntensityField {
        IntensityField::from_fn(64, 48, |px, py| if (px, py) == (x, y) { 255 } else { 10 })
    }

    fn controls() -> TickControls {
        TickControls::default()
    }

    #[test]
    fn test_scenario_camera_only_normal_blend() {
        let mut est = CursorEstimator::new(SCREEN);
        let ctl = TickControls {
            imu_active: false,
            noise_suppression: false,
            ..controls()
        };

        // Spot at the trimmed-rect center maps to the screen center; use an
        // off-center spot to see the blend move.
        let out = est.tick(&field_with_spot(48, 24), None, &ctl).unwrap();
        assert_eq!(out.mode, Mode::CameraNormal);

        // margin 0.1 on 64x48: x span [6.4, 57.6], camera x = (48-6.4)/51.2*1919
        let camera_x = (48.0 - 6.4) / 51.2 * 1919.0;
        let expected_x = 0.6 * 960.0 + 0.4 * camera_x;
        let fused = est.state().fused();
        assert!((fused.x - expected_x).abs() < 1e-6, "fused.x = {}", fused.x);
        assert_eq!(out.pointer.unwrap(), fused);
    }

    #[test]
    fn test_scenario_imu_prediction_exact_step() {
        let mut est = CursorEstimator::new(SCREEN);
        let ctl = TickControls {
            imu_active: true,
            ..controls()
        };

        // Camera dark, IMU moving with dx = 2.0: sensitivity 5.0 gives +10 px.
        let out = est
            .tick(&dark_field(), Some("2.0,0.0,0.0,0.0,0.0,0.0"), &ctl)
            .unwrap();

        assert_eq!(out.mode, Mode::ImuPrediction);
        assert!((est.state().fused().x - 970.0).abs() < 1e-9);
        assert_eq!(est.state().fused().y, 540.0);
    }

    #[test]
    fn test_scenario_noise_suppression_on_camera_jump() {
        let mut est = CursorEstimator::new(SCREEN);
        let ctl = TickControls {
            imu_active: true,
            cam_motion_threshold: 5.0,
            ..controls()
        };

        // First tick establishes last_camera near the center.
        est.tick(&field_with_spot(32, 24), None, &ctl).unwrap();

        // Next spot one pixel over: displacement ≈ 37 px > 5, IMU still.
        let out = est.tick(&field_with_spot(33, 24), None, &ctl).unwrap();
        assert_eq!(out.mode, Mode::CameraNoiseSuppressed);
    }

    #[test]
    fn test_scenario_paused_holds_everything() {
        let mut est = CursorEstimator::new(SCREEN);
        let ctl = TickControls {
            paused: true,
            imu_active: true,
            ..controls()
        };
        let before = est.state().fused();

        let out = est
            .tick(&field_with_spot(10, 10), Some("9.0,0.0,9.0,0.0,0.0,0.0"), &ctl)
            .unwrap();

        assert_eq!(out.mode, Mode::Idle);
        assert_eq!(out.pointer, None);
        assert_eq!(est.state().fused(), before);
    }

    #[test]
    fn test_pause_still_records_camera_point() {
        let mut est = CursorEstimator::new(SCREEN);
        let paused = TickControls {
            paused: true,
            ..controls()
        };
        let running = TickControls {
            imu_active: true,
            cam_motion_threshold: 5.0,
            ..controls()
        };

        // While paused the camera point is still recorded...
        est.tick(&field_with_spot(32, 24), None, &paused).unwrap();

        // ...so resuming on the same spot sees no displacement spike.
        let out = est.tick(&field_with_spot(32, 24), None, &running).unwrap();
        assert_eq!(out.mode, Mode::CameraNormal);
    }

    #[test]
    fn test_malformed_record_acts_like_no_sample() {
        let mut est_a = CursorEstimator::new(SCREEN);
        let mut est_b = CursorEstimator::new(SCREEN);
        let ctl = TickControls {
            imu_active: true,
            ..controls()
        };

        let out_a = est_a
            .tick(&dark_field(), Some("1.0,2.0,3.0"), &ctl)
            .unwrap();
        let out_b = est_b.tick(&dark_field(), None, &ctl).unwrap();

        assert!(!out_a.record_decoded);
        assert_eq!(out_a.mode, out_b.mode);
        assert_eq!(est_a.state().fused(), est_b.state().fused());
    }

    #[test]
    fn test_first_accel_sample_never_predicts() {
        let mut est = CursorEstimator::new(SCREEN);
        let ctl = TickControls {
            imu_active: true,
            ..controls()
        };

        // Accelerating hard, but it is the first position sample: hold.
        let out = est
            .tick(&dark_field(), Some("0,500.0,500.0,0,0,0,0,3.0,3.0,0"), &ctl)
            .unwrap();
        assert_eq!(out.mode, Mode::NoTarget);
        assert_eq!(est.state().fused(), SCREEN.center());

        // Second sample carries a real delta and predicts.
        let out = est
            .tick(&dark_field(), Some("0,502.0,500.0,0,0,0,0,3.0,3.0,0"), &ctl)
            .unwrap();
        assert_eq!(out.mode, Mode::ImuPrediction);
        assert!((est.state().fused().x - 970.0).abs() < 1e-9);
    }

    #[test]
    fn test_reset_imu_forgets_position_history() {
        let mut est = CursorEstimator::new(SCREEN);
        let ctl = TickControls {
            imu_active: true,
            ..controls()
        };

        est.tick(&dark_field(), Some("0,100.0,100.0,0,0,0,0,3.0,0,0"), &ctl)
            .unwrap();
        est.reset_imu();

        // After a reconnect the next sample is first again: no prediction.
        let out = est
            .tick(&dark_field(), Some("0,900.0,900.0,0,0,0,0,3.0,0,0"), &ctl)
            .unwrap();
        assert_eq!(out.mode, Mode::NoTarget);
    }

    #[test]
    fn test_no_target_still_emits_held_pointer() {
        let mut est = CursorEstimator::new(SCREEN);
        let out = est.tick(&dark_field(), None, &controls()).unwrap();

        assert_eq!(out.mode, Mode::NoTarget);
        assert_eq!(out.pointer.unwrap(), SCREEN.center());
    }

    #[test]
    fn test_fused_stays_inside_screen_under_dead_reckoning() {
        let mut est = CursorEstimator::new(SCREEN);
        let ctl = TickControls {
            imu_active: true,
            ..controls()
        };

        for _ in 0..100 {
            let out = est
                .tick(&dark_field(), Some("50.0,0.0,0.0,0.0,0.0,0.0"), &ctl)
                .unwrap();
            let p = out.pointer.unwrap();
            assert!(p.x <= SCREEN.max_x());
            assert_eq!(est.state().fused(), p);
        }
        assert_eq!(est.state().fused().x, SCREEN.max_x());
    }

    #[test]
    fn test_zero_sized_field_is_fatal() {
        let mut est = CursorEstimator::new(SCREEN);
        let field = IntensityField::new(0, 0, Vec::new());
        assert!(est.tick(&field, None, &controls()).is_err());
    }

    #[test]
    fn test_invalid_spot_still_reported() {
        let mut est = CursorEstimator::new(SCREEN);
        let out = est.tick(&dark_field(), None, &controls()).unwrap();
        assert!(!out.spot.valid);
        assert_eq!(out.spot.intensity, 10);
    }
}
