//! Intensity Fields and Bright-Spot Location
//!
//! A grayscale frame is a row-major `u8` buffer with declared dimensions.
//! The locator scans the whole field for its global maximum; the brightest
//! pixel is the tracking candidate and a threshold decides whether it counts
//! as a real target or ambient glare.

use crate::tracking::error::{Result, TrackingError};

/// Owned grayscale frame, row-major, one `u8` sample per pixel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntensityField {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl IntensityField {
    /// Create a field from raw samples
    ///
    /// Dimensions are taken on trust here; [`find_bright_spot`] validates
    /// them before scanning.
    pub fn new(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            data,
        }
    }

    /// Build a field by evaluating `f(x, y)` for every pixel
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> u8) -> Self {
        let mut data = Vec::with_capacity((width as usize) * (height as usize));
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Field width in pixels
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Field height in pixels
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw sample buffer
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Sample at (x, y); panics on out-of-bounds access
    pub fn get(&self, x: u32, y: u32) -> u8 {
        self.data[(y as usize) * (self.width as usize) + (x as usize)]
    }

    /// Flip the field horizontally in place
    ///
    /// Applied before locating when the scene should behave like a mirror,
    /// so tie-breaking runs in the orientation the operator sees.
    pub fn mirror_rows(&mut self) {
        let w = self.width as usize;
        if w == 0 {
            return;
        }
        for row in self.data.chunks_exact_mut(w) {
            row.reverse();
        }
    }
}

/// Brightest-pixel observation for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameObservation {
    /// Pixel coordinates of the brightest sample
    pub pixel: (u32, u32),
    /// Intensity of that sample
    pub intensity: u8,
    /// Whether the intensity reached the tracking threshold
    pub valid: bool,
}

/// Locate the brightest pixel in the field
///
/// Ties resolve to the first maximal pixel in raster order (row by row,
/// left to right). The observation is `valid` when the maximum reaches
/// `threshold`; an invalid observation is a normal "no target" outcome,
/// not an error.
///
/// A zero-sized field or a buffer that does not match the declared
/// dimensions is a programming error and fails fast.
pub fn find_bright_spot(field: &IntensityField, threshold: u8) -> Result<FrameObservation> {
    let width = field.width();
    let height = field.height();

    if width == 0 || height == 0 {
        return Err(TrackingError::EmptyField { width, height });
    }

    let expected = (width as usize) * (height as usize);
    let data = field.data();
    if data.len() != expected {
        return Err(TrackingError::FieldSizeMismatch {
            width,
            height,
            expected,
            actual: data.len(),
        });
    }

    // Strict `>` keeps the first maximum, which is the raster-order winner.
    let mut best_index = 0usize;
    let mut best_value = data[0];
    for (index, &value) in data.iter().enumerate().skip(1) {
        if value > best_value {
            best_value = value;
            best_index = index;
        }
    }

    let x = (best_index % (width as usize)) as u32;
    let y = (best_index / (width as usize)) as u32;

    Ok(FrameObservation {
        pixel: (x, y),
        intensity: best_value,
        valid: best_value >= threshold,
    })
}
