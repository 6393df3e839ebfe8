//! Pointer Output
//!
//! The estimator emits clamped pointer targets through the [`PointerSink`]
//! trait. OS-level injection backends live outside this crate; the shipped
//! sinks log the trajectory or discard it, which is all the demo profile
//! and the test suite need.

use tracing::trace;

use crate::tracking::ScreenPoint;

/// Consumer of per-tick pointer targets
pub trait PointerSink: Send {
    /// Move the pointer to an absolute screen position
    ///
    /// The target is already clamped into the screen rectangle.
    fn move_to(&mut self, point: ScreenPoint);
}

/// Sink that logs every move at trace level
#[derive(Debug, Default)]
pub struct TracingPointer;

impl PointerSink for TracingPointer {
    fn move_to(&mut self, point: ScreenPoint) {
        trace!("pointer -> ({:.1}, {:.1})", point.x, point.y);
    }
}

/// Sink that discards every move
#[derive(Debug, Default)]
pub struct NullPointer;

impl PointerSink for NullPointer {
    fn move_to(&mut self, _point: ScreenPoint) {}
}
