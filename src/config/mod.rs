//! Tracker Configuration
//!
//! TOML-backed settings for the screen, the camera, the IMU link, the
//! fusion filter and the click relay. Every key has a default, so an
//! absent file is a valid configuration. CLI overrides merge on top.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

use crate::tracking::{ScreenSize, TickControls};

pub mod types;

pub use types::{CameraConfig, FusionConfig, ImuConfig, RelayConfig, ScreenConfig};

/// Complete tracker configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Target screen configuration
    #[serde(default)]
    pub screen: ScreenConfig,
    /// Camera and detection configuration
    #[serde(default)]
    pub camera: CameraConfig,
    /// IMU link configuration
    #[serde(default)]
    pub imu: ImuConfig,
    /// Fusion filter configuration
    #[serde(default)]
    pub fusion: FusionConfig,
    /// Click relay configuration
    #[serde(default)]
    pub relay: RelayConfig,
}

impl Config {
    /// Load and validate a configuration file
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Load from file if it exists, otherwise use defaults
    pub fn load_or_default(path: &str) -> Result<Self> {
        if Path::new(path).exists() {
            Self::load(path)
        } else {
            tracing::info!("Config file {} not found, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Reject out-of-range settings before they reach the pipeline
    pub fn validate(&self) -> Result<()> {
        if self.screen.width == 0 || self.screen.height == 0 {
            anyhow::bail!(
                "Screen dimensions must be nonzero, got {}x{}",
                self.screen.width,
                self.screen.height
            );
        }

        if self.camera.width == 0 || self.camera.height == 0 {
            anyhow::bail!(
                "Camera dimensions must be nonzero, got {}x{}",
                self.camera.width,
                self.camera.height
            );
        }

        if !(0.0..=0.4).contains(&self.camera.safety_margin) {
            anyhow::bail!(
                "safety_margin must be within 0.0 - 0.4, got {}",
                self.camera.safety_margin
            );
        }

        if self.camera.fps <= 0.0 || self.camera.fps > 240.0 {
            anyhow::bail!("Camera fps must be within 0 - 240, got {}", self.camera.fps);
        }

        for (name, alpha) in [
            ("alpha_normal", self.fusion.alpha_normal),
            ("alpha_stationary", self.fusion.alpha_stationary),
        ] {
            if !(alpha > 0.0 && alpha <= 1.0) {
                anyhow::bail!("{} must be within (0, 1], got {}", name, alpha);
            }
        }

        if self.fusion.alpha_stationary > self.fusion.alpha_normal {
            anyhow::bail!(
                "alpha_stationary ({}) cannot exceed alpha_normal ({})",
                self.fusion.alpha_stationary,
                self.fusion.alpha_normal
            );
        }

        if self.fusion.cam_motion_threshold < 0.0 {
            anyhow::bail!(
                "cam_motion_threshold cannot be negative, got {}",
                self.fusion.cam_motion_threshold
            );
        }

        if self.imu.dead_zone < 0.0 || self.imu.accel_threshold < 0.0 {
            anyhow::bail!("IMU thresholds cannot be negative");
        }

        if self.imu.port.trim().is_empty() {
            anyhow::bail!("IMU port cannot be empty (use \"auto\" for discovery)");
        }

        if self.imu.baud == 0 {
            anyhow::bail!("IMU baud rate must be nonzero");
        }

        self.relay
            .listen
            .parse::<SocketAddr>()
            .context("Invalid relay listen address")?;

        Ok(())
    }

    /// Merge CLI overrides on top of the file values
    pub fn with_overrides(
        mut self,
        relay_listen: Option<String>,
        serial_port: Option<String>,
        disable_imu: bool,
    ) -> Self {
        if let Some(listen) = relay_listen {
            self.relay.listen = listen;
        }
        if let Some(port) = serial_port {
            self.imu.port = port;
        }
        if disable_imu {
            self.imu.enabled = false;
        }
        self
    }

    /// Screen geometry as used by the estimator
    pub fn screen_size(&self) -> ScreenSize {
        ScreenSize::new(self.screen.width, self.screen.height)
    }

    /// Initial tick controls derived from this configuration
    ///
    /// `imu_active` carries the configured intent; the runtime ANDs link
    /// health into each tick's snapshot.
    pub fn tick_controls(&self) -> TickControls {
        TickControls {
            paused: false,
            imu_active: self.imu.enabled,
            noise_suppression: self.fusion.noise_suppression,
            brightness_threshold: self.camera.brightness_threshold,
            safety_margin: self.camera.safety_margin,
            dead_zone: self.imu.dead_zone,
            accel_threshold: self.imu.accel_threshold,
            cam_motion_threshold: self.fusion.cam_motion_threshold,
            alpha_normal: self.fusion.alpha_normal,
            alpha_stationary: self.fusion.alpha_stationary,
            sensitivity_x: self.fusion.sensitivity_x,
            sensitivity_y: self.fusion.sensitivity_y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.screen.width, 1920);
        assert_eq!(config.imu.port, "auto");
        assert_eq!(config.relay.listen, "0.0.0.0:5000");
    }

    #[test]
    fn test_defaults_match_tick_controls() {
        let from_config = Config::default().tick_controls();
        let built_in = TickControls {
            imu_active: true,
            ..TickControls::default()
        };
        assert_eq!(from_config, built_in);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [fusion]
            sensitivity_x = 8.0

            [imu]
            port = "/dev/ttyACM0"
            "#,
        )
        .unwrap();

        assert_eq!(config.fusion.sensitivity_x, 8.0);
        assert_eq!(config.fusion.sensitivity_y, -10.0);
        assert_eq!(config.imu.port, "/dev/ttyACM0");
        assert_eq!(config.camera.brightness_threshold, 200);
    }

    #[test]
    fn test_load_round_trip() {
        let config = Config::default();
        let serialized = toml::to_string_pretty(&config).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serialized.as_bytes()).unwrap();

        let loaded = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(loaded.fusion.alpha_normal, config.fusion.alpha_normal);
        assert_eq!(loaded.camera.mirror, config.camera.mirror);
    }

    #[test]
    fn test_margin_out_of_range_rejected() {
        let mut config = Config::default();
        config.camera.safety_margin = 0.5;
        assert!(config.validate().is_err());

        config.camera.safety_margin = -0.1;
        assert!(config.validate().is_err());

        config.camera.safety_margin = 0.4;
        config.validate().unwrap();
    }

    #[test]
    fn test_alpha_ordering_enforced() {
        let mut config = Config::default();
        config.fusion.alpha_stationary = 0.9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_screen_rejected() {
        let mut config = Config::default();
        config.screen.width = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_listen_address_rejected() {
        let mut config = Config::default();
        config.relay.listen = "not-an-address".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let config = Config::default().with_overrides(
            Some("127.0.0.1:8800".to_string()),
            Some("/dev/ttyUSB3".to_string()),
            true,
        );

        assert_eq!(config.relay.listen, "127.0.0.1:8800");
        assert_eq!(config.imu.port, "/dev/ttyUSB3");
        assert!(!config.imu.enabled);
    }
}
