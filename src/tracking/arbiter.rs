//! Mode Arbitration
//!
//! One pure decision per tick: which sensor drives the cursor. The arbiter
//! holds no state and consults none; every input it needs arrives in
//! [`ArbiterInput`], so the same inputs always produce the same mode.
//!
//! # Decision table
//!
//! The master pause flag wins outright. Otherwise the first matching row
//! applies:
//!
//! ```text
//! 1. imu_active  AND !cam_valid AND imu_moving AND delta != 0  → ImuPrediction
//! 2. cam_valid AND imu_active AND !imu_moving
//!        AND displacement > motion threshold                   → CameraNoiseSuppressed
//! 3. cam_valid AND imu_active                                  → CameraNormal
//! 4. cam_valid AND !imu_active AND noise_suppression           → CameraNoiseSuppressed
//! 5. cam_valid AND !imu_active                                 → CameraNormal
//! 6. anything else                                             → NoTarget
//! ```
//!
//! Row 2 catches camera jitter: the IMU says the rig is still but the
//! camera point jumped, so the blend factor drops to the stationary value.
//! Row 1's nonzero-delta guard keeps the first position-layout sample after
//! a reconnect (motion flag set, delta zero) from dead-reckoning; such rows
//! fall through to row 6 and hold.

use serde::Serialize;

/// Which sensor drives the cursor this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Master pause: no state update, no pointer output
    Idle,
    /// Camera observation blended at the normal rate
    CameraNormal,
    /// Camera observation blended at the stationary rate
    CameraNoiseSuppressed,
    /// Dead-reckoning from IMU deltas while the camera has no target
    ImuPrediction,
    /// Nothing to track: hold position
    NoTarget,
}

impl Mode {
    /// Human-readable status label
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Idle => "paused",
            Mode::CameraNormal => "camera tracking",
            Mode::CameraNoiseSuppressed => "noise suppression",
            Mode::ImuPrediction => "imu prediction",
            Mode::NoTarget => "no target",
        }
    }

    /// Status display color hint
    pub fn color(&self) -> &'static str {
        match self {
            Mode::Idle => "yellow",
            Mode::CameraNormal => "cyan",
            Mode::CameraNoiseSuppressed => "orange",
            Mode::ImuPrediction => "magenta",
            Mode::NoTarget => "red",
        }
    }

    /// True for every mode except `Idle`
    ///
    /// Active ticks emit a pointer target, `NoTarget` included (the held
    /// position, clamped).
    pub fn is_active(&self) -> bool {
        *self != Mode::Idle
    }
}

/// Everything the arbiter looks at for one tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ArbiterInput {
    /// Master pause flag
    pub paused: bool,
    /// Camera observation reached the brightness threshold
    pub cam_valid: bool,
    /// IMU fusion requested and a live link is attached
    pub imu_active: bool,
    /// IMU classified its sample as motion
    pub imu_moving: bool,
    /// The IMU delta has a nonzero component
    pub imu_delta_nonzero: bool,
    /// Camera point displacement since the previous tick
    pub cam_displacement: f64,
    /// Displacement above this while the IMU is still counts as noise
    pub cam_motion_threshold: f64,
    /// Camera-only noise suppression flag
    pub noise_suppression: bool,
}

/// Pick the mode for one tick
pub fn select_mode(input: &ArbiterInput) -> Mode {
    if input.paused {
        return Mode::Idle;
    }

    if input.imu_active && !input.cam_valid && input.imu_moving && input.imu_delta_nonzero {
        return Mode::ImuPrediction;
    }

    if input.cam_valid && input.imu_active {
        if !input.imu_moving && input.cam_displacement > input.cam_motion_threshold {
            return Mode::CameraNoiseSuppressed;
        }
        return Mode::CameraNormal;
    }

    if input.cam_valid {
        if input.noise_suppression {
            return Mode::CameraNoiseSuppressed;
        }
        return Mode::CameraNormal;
    }

    Mode::NoTarget
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pause_overrides_everything() {
        let input = ArbiterInput {
            paused: true,
            cam_valid: true,
            imu_active: true,
            imu_moving: true,
            imu_delta_nonzero: true,
            cam_displacement: 100.0,
            cam_motion_threshold: 0.5,
            noise_suppression: true,
        };
        assert_eq!(select_mode(&input), Mode::Idle);
    }

    #[test]
    fn test_imu_prediction_when_camera_lost() {
        let input = ArbiterInput {
            imu_active: true,
            imu_moving: true,
            imu_delta_nonzero: true,
            ..Default::default()
        };
        assert_eq!(select_mode(&input), Mode::ImuPrediction);
    }

    #[test]
    fn test_zero_delta_motion_flag_holds() {
        // First position-layout sample after reconnect: moving, delta zero.
        let input = ArbiterInput {
            imu_active: true,
            imu_moving: true,
            imu_delta_nonzero: false,
            ..Default::default()
        };
        assert_eq!(select_mode(&input), Mode::NoTarget);
    }

    #[test]
    fn test_camera_wins_over_imu_when_valid() {
        let input = ArbiterInput {
            cam_valid: true,
            imu_active: true,
            imu_moving: true,
            imu_delta_nonzero: true,
            ..Default::default()
        };
        assert_eq!(select_mode(&input), Mode::CameraNormal);
    }

    #[test]
    fn test_still_imu_with_camera_jump_suppresses() {
        let input = ArbiterInput {
            cam_valid: true,
            imu_active: true,
            cam_displacement: 6.0,
            cam_motion_threshold: 5.0,
            ..Default::default()
        };
        assert_eq!(select_mode(&input), Mode::CameraNoiseSuppressed);
    }

    #[test]
    fn test_displacement_at_threshold_stays_normal() {
        let input = ArbiterInput {
            cam_valid: true,
            imu_active: true,
            cam_displacement: 5.0,
            cam_motion_threshold: 5.0,
            ..Default::default()
        };
        assert_eq!(select_mode(&input), Mode::CameraNormal);
    }

    #[test]
    fn test_camera_only_flag_selects_suppression() {
        let input = ArbiterInput {
            cam_valid: true,
            noise_suppression: true,
            // Displacement is irrelevant on this row.
            cam_displacement: 0.0,
            ..Default::default()
        };
        assert_eq!(select_mode(&input), Mode::CameraNoiseSuppressed);
    }

    #[test]
    fn test_camera_only_normal() {
        let input = ArbiterInput {
            cam_valid: true,
            ..Default::default()
        };
        assert_eq!(select_mode(&input), Mode::CameraNormal);
    }

    #[test]
    fn test_nothing_to_track() {
        assert_eq!(select_mode(&ArbiterInput::default()), Mode::NoTarget);

        let input = ArbiterInput {
            imu_active: true,
            ..Default::default()
        };
        assert_eq!(select_mode(&input), Mode::NoTarget);
    }

    #[test]
    fn test_arbiter_is_pure() {
        let input = ArbiterInput {
            cam_valid: true,
            imu_active: true,
            cam_displacement: 6.0,
            cam_motion_threshold: 5.0,
            ..Default::default()
        };
        let first = select_mode(&input);
        for _ in 0..100 {
            assert_eq!(select_mode(&input), first);
        }
    }

    #[test]
    fn test_labels_and_colors_are_distinct() {
        let modes = [
            Mode::Idle,
            Mode::CameraNormal,
            Mode::CameraNoiseSuppressed,
            Mode::ImuPrediction,
            Mode::NoTarget,
        ];
        for (i, a) in modes.iter().enumerate() {
            for b in modes.iter().skip(i + 1) {
                assert_ne!(a.label(), b.label());
                assert_ne!(a.color(), b.color());
            }
        }
        assert!(!Mode::Idle.is_active());
        assert!(Mode::NoTarget.is_active());
    }
}
