//! Configuration type definitions

use serde::{Deserialize, Serialize};

/// Target screen configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenConfig {
    /// Screen width in pixels
    #[serde(default = "default_screen_width")]
    pub width: u32,

    /// Screen height in pixels
    #[serde(default = "default_screen_height")]
    pub height: u32,
}

fn default_screen_width() -> u32 {
    1920
}
fn default_screen_height() -> u32 {
    1080
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: default_screen_width(),
            height: default_screen_height(),
        }
    }
}

/// Camera and bright-spot detection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Frame width in pixels
    #[serde(default = "default_camera_width")]
    pub width: u32,

    /// Frame height in pixels
    #[serde(default = "default_camera_height")]
    pub height: u32,

    /// Frames per second the source is paced at
    #[serde(default = "default_camera_fps")]
    pub fps: f64,

    /// Minimum intensity for a bright spot to count as a target
    #[serde(default = "default_brightness_threshold")]
    pub brightness_threshold: u8,

    /// Fraction of each frame edge excluded from mapping (0.0 - 0.4)
    #[serde(default = "default_safety_margin")]
    pub safety_margin: f64,

    /// Flip frames horizontally so the scene behaves like a mirror
    #[serde(default = "default_mirror")]
    pub mirror: bool,
}

fn default_camera_width() -> u32 {
    640
}
fn default_camera_height() -> u32 {
    480
}
fn default_camera_fps() -> f64 {
    30.0
}
fn default_brightness_threshold() -> u8 {
    200
}
fn default_safety_margin() -> f64 {
    0.1
}
fn default_mirror() -> bool {
    true
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: default_camera_width(),
            height: default_camera_height(),
            fps: default_camera_fps(),
            brightness_threshold: default_brightness_threshold(),
            safety_margin: default_safety_margin(),
            mirror: default_mirror(),
        }
    }
}

/// IMU link and decoding configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImuConfig {
    /// Enable IMU fusion when a link is available
    #[serde(default = "default_imu_enabled")]
    pub enabled: bool,

    /// Serial device path, or "auto" to discover one
    #[serde(default = "default_imu_port")]
    pub port: String,

    /// Serial baud rate
    #[serde(default = "default_baud")]
    pub baud: u32,

    /// Orientation deltas at or below this magnitude are not motion
    #[serde(default = "default_dead_zone")]
    pub dead_zone: f64,

    /// Accelerations at or below this magnitude are not motion
    #[serde(default = "default_accel_threshold")]
    pub accel_threshold: f64,
}

fn default_imu_enabled() -> bool {
    true
}
fn default_imu_port() -> String {
    "auto".to_string()
}
fn default_baud() -> u32 {
    115_200
}
fn default_dead_zone() -> f64 {
    0.5
}
fn default_accel_threshold() -> f64 {
    0.5
}

impl Default for ImuConfig {
    fn default() -> Self {
        Self {
            enabled: default_imu_enabled(),
            port: default_imu_port(),
            baud: default_baud(),
            dead_zone: default_dead_zone(),
            accel_threshold: default_accel_threshold(),
        }
    }
}

/// Fusion filter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Camera blend factor in normal tracking (0.0 - 1.0)
    #[serde(default = "default_alpha_normal")]
    pub alpha_normal: f64,

    /// Camera blend factor while noise suppression is active
    #[serde(default = "default_alpha_stationary")]
    pub alpha_stationary: f64,

    /// Screen pixels per IMU delta unit, x axis
    #[serde(default = "default_sensitivity_x")]
    pub sensitivity_x: f64,

    /// Screen pixels per IMU delta unit, y axis (negative inverts)
    #[serde(default = "default_sensitivity_y")]
    pub sensitivity_y: f64,

    /// Camera displacement above this while the IMU is still is noise
    #[serde(default = "default_cam_motion_threshold")]
    pub cam_motion_threshold: f64,

    /// Camera-only noise suppression flag
    #[serde(default)]
    pub noise_suppression: bool,
}

fn default_alpha_normal() -> f64 {
    0.4
}
fn default_alpha_stationary() -> f64 {
    0.1
}
fn default_sensitivity_x() -> f64 {
    5.0
}
fn default_sensitivity_y() -> f64 {
    -10.0
}
fn default_cam_motion_threshold() -> f64 {
    0.5
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            alpha_normal: default_alpha_normal(),
            alpha_stationary: default_alpha_stationary(),
            sensitivity_x: default_sensitivity_x(),
            sensitivity_y: default_sensitivity_y(),
            cam_motion_threshold: default_cam_motion_threshold(),
            noise_suppression: false,
        }
    }
}

/// Click relay configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Enable the HTTP click relay
    #[serde(default = "default_relay_enabled")]
    pub enabled: bool,

    /// Address to listen on (e.g., "0.0.0.0:5000")
    #[serde(default = "default_relay_listen")]
    pub listen: String,
}

fn default_relay_enabled() -> bool {
    true
}
fn default_relay_listen() -> String {
    "0.0.0.0:5000".to_string()
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            enabled: default_relay_enabled(),
            listen: default_relay_listen(),
        }
    }
}
