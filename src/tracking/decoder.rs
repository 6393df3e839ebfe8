//! IMU Record Decoding
//!
//! IMU samples arrive as comma-separated numeric text lines. Two wire
//! layouts are supported, selected per record by field count:
//!
//! - **6 fields** (orientation deltas): fields 0 and 2 are the heading and
//!   pitch deltas since the previous sample. Motion means either delta
//!   exceeds the dead zone.
//! - **10 or more fields** (position + acceleration): fields 1 and 2 are an
//!   absolute position, fields 7 and 8 are accelerations. Motion means
//!   either acceleration exceeds the threshold; the cursor delta is the
//!   position difference against the previous accepted sample.
//!
//! Anything else is a malformed record: dropped without touching decoder
//! state, exactly as if no sample had arrived this tick. Firmware hiccups
//! and boot banners must never kill the loop.

use tracing::trace;

/// Decoded per-tick IMU motion
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ImuDelta {
    /// Horizontal delta in sensor units
    pub dx: f64,
    /// Vertical delta in sensor units
    pub dy: f64,
    /// Whether the sensor classified this sample as real motion
    pub moving: bool,
}

impl ImuDelta {
    /// True when either component is nonzero
    ///
    /// Gates dead-reckoning so a motion flag with no displacement (the
    /// first sample after a reconnect) cannot move the cursor.
    pub fn is_nonzero(&self) -> bool {
        self.dx != 0.0 || self.dy != 0.0
    }
}

/// Stateful record decoder
///
/// The only state is the previous absolute position for the
/// position/acceleration layout; orientation-delta records are stateless.
#[derive(Debug, Default)]
pub struct RecordDecoder {
    last_position: Option<(f64, f64)>,
}

impl RecordDecoder {
    /// Create a decoder with no position history
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one raw record
    ///
    /// Returns `None` for malformed records (wrong field count or
    /// non-numeric fields in the positions used); the caller treats that as
    /// "no sample this tick".
    pub fn decode(&mut self, record: &str, dead_zone: f64, accel_threshold: f64) -> Option<ImuDelta> {
        let record = record.trim();
        if record.is_empty() {
            return None;
        }

        let fields: Vec<&str> = record.split(',').collect();
        let delta = match fields.len() {
            6 => self.decode_orientation(&fields, dead_zone),
            n if n >= 10 => self.decode_position(&fields, accel_threshold),
            _ => None,
        };

        if delta.is_none() {
            trace!("Dropped malformed IMU record ({} fields)", fields.len());
        }
        delta
    }

    /// Forget the previous position sample
    ///
    /// Called when the serial link (re)connects so the next position-layout
    /// record is treated as a fresh first sample: zero delta, no motion
    /// event on its own.
    pub fn reset(&mut self) {
        self.last_position = None;
    }

    fn decode_orientation(&self, fields: &[&str], dead_zone: f64) -> Option<ImuDelta> {
        let dh: f64 = fields[0].trim().parse().ok()?;
        let dp: f64 = fields[2].trim().parse().ok()?;

        Some(ImuDelta {
            dx: dh,
            dy: dp,
            moving: dh.abs() > dead_zone || dp.abs() > dead_zone,
        })
    }

    fn decode_position(&mut self, fields: &[&str], accel_threshold: f64) -> Option<ImuDelta> {
        let px: f64 = fields[1].trim().parse().ok()?;
        let py: f64 = fields[2].trim().parse().ok()?;
        let ax: f64 = fields[7].trim().parse().ok()?;
        let ay: f64 = fields[8].trim().parse().ok()?;

        // All fields parsed; only now is it safe to touch state.
        let (dx, dy) = match self.last_position {
            Some((lx, ly)) => (px - lx, py - ly),
            None => (0.0, 0.0),
        };
        self.last_position = Some((px, py));

        Some(ImuDelta {
            dx,
            dy,
            moving: ax.abs() > accel_threshold || ay.abs() > accel_threshold,
        })
    }
}
