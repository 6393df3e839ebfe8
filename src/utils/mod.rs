//! Utility Functions and Diagnostics
//!
//! System diagnostics and user-friendly error formatting.
//!
//! [`log_startup_diagnostics`] records the runtime environment (OS, session
//! type, attached serial devices) once at startup so a bug report's log
//! already answers the usual first questions. [`format_user_error`] turns a
//! fatal [`anyhow::Error`] into a boxed message with troubleshooting steps
//! keyed to the error's category.

pub mod diagnostics;
pub mod errors;

pub use diagnostics::{detect_session_type, log_startup_diagnostics, SystemInfo};
pub use errors::format_user_error;
