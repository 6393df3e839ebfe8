//! Fatal Error Formatting
//!
//! Turns the error chain that ends a run into a message an operator can
//! act on, with per-category troubleshooting steps.

use std::fmt::Write;

/// Render a fatal error with troubleshooting hints
///
/// The category is sniffed from the message text, so `.context()` strings
/// attached at the call sites double as routing keys.
pub fn format_user_error(error: &anyhow::Error) -> String {
    let mut output = String::new();

    // Banner
    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "╔════════════════════════════════════════════════════════════╗"
    )
    .ok();
    writeln!(
        &mut output,
        "║                     ERROR                                  ║"
    )
    .ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();
    writeln!(&mut output).ok();

    // Route on the message text
    let error_msg = error.to_string();
    let lowered = error_msg.to_lowercase();

    if lowered.contains("serial") || lowered.contains("imu") || lowered.contains("port") {
        format_serial_error(&mut output);
    } else if lowered.contains("frame") || lowered.contains("camera") || lowered.contains("field") {
        format_camera_error(&mut output);
    } else if lowered.contains("bind") || lowered.contains("address") {
        format_network_error(&mut output);
    } else if lowered.contains("config") {
        format_config_error(&mut output);
    } else {
        format_generic_error(&mut output, &error_msg);
    }

    // Full chain for bug reports
    writeln!(&mut output).ok();
    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Technical Details:").ok();
    writeln!(&mut output).ok();
    writeln!(&mut output, "{:#}", error).ok();
    writeln!(&mut output).ok();

    // Help footer
    writeln!(
        &mut output,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    )
    .ok();
    writeln!(&mut output, "Need Help?").ok();
    writeln!(
        &mut output,
        "  - Run with --verbose for detailed logs: glowtrack -vvv"
    )
    .ok();
    writeln!(
        &mut output,
        "  - Keep a log for bug reports: glowtrack --log-file glowtrack.log"
    )
    .ok();
    writeln!(
        &mut output,
        "╚════════════════════════════════════════════════════════════╝"
    )
    .ok();

    output
}

fn format_serial_error(output: &mut String) {
    writeln!(output, "IMU Serial Link Error").ok();
    writeln!(output).ok();
    writeln!(output, "Could not open or talk to the IMU over serial.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Device not plugged in").ok();
    writeln!(output, "     → Check: ls /dev/ttyACM* /dev/ttyUSB*").ok();
    writeln!(output, "     → Replug the device and wait a few seconds").ok();
    writeln!(output).ok();
    writeln!(output, "  2. No permission to open the port").ok();
    writeln!(
        output,
        "     → Add your user to the dialout group: sudo usermod -aG dialout $USER"
    )
    .ok();
    writeln!(output, "     → Log out and log back in").ok();
    writeln!(output).ok();
    writeln!(output, "  3. Auto-discovery picked the wrong device").ok();
    writeln!(
        output,
        "     → Name it explicitly: glowtrack --serial-port /dev/ttyACM0"
    )
    .ok();
    writeln!(
        output,
        "     → Or in config.toml: [imu] port = \"/dev/ttyACM0\""
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "  4. You do not need the IMU right now").ok();
    writeln!(
        output,
        "     → Camera-only tracking: glowtrack --no-imu"
    )
    .ok();
}

fn format_camera_error(output: &mut String) {
    writeln!(output, "Frame Source Error").ok();
    writeln!(output).ok();
    writeln!(output, "The camera frame source stopped or produced bad frames.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Frame dimensions do not match the configuration").ok();
    writeln!(
        output,
        "     → Check [camera] width/height in config.toml against the device"
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "  2. The source was closed mid-run").ok();
    writeln!(output, "     → Check whether another program grabbed the camera").ok();
    writeln!(output, "     → Restart the tracker").ok();
}

fn format_network_error(output: &mut String) {
    writeln!(output, "Relay Binding Error").ok();
    writeln!(output).ok();
    writeln!(output, "Could not bind the click relay's listen address.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Port already in use").ok();
    writeln!(output, "     → Check: ss -tlnp | grep 5000").ok();
    writeln!(
        output,
        "     → Change it: glowtrack --listen 0.0.0.0:5001"
    )
    .ok();
    writeln!(output).ok();
    writeln!(output, "  2. Permission denied (port < 1024)").ok();
    writeln!(output, "     → Use a port >= 1024").ok();
    writeln!(output).ok();
    writeln!(output, "  3. Invalid listen address").ok();
    writeln!(
        output,
        "     → Should be 'IP:PORT', like '0.0.0.0:5000'"
    )
    .ok();
}

fn format_config_error(output: &mut String) {
    writeln!(output, "Configuration Error").ok();
    writeln!(output).ok();
    writeln!(output, "Problem with the configuration file.").ok();
    writeln!(output).ok();
    writeln!(output, "Common Causes:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Configuration file not found").ok();
    writeln!(output, "     → Default location: glowtrack.toml in the working directory").ok();
    writeln!(output, "     → Or specify: glowtrack -c /path/to/config.toml").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Invalid TOML syntax").ok();
    writeln!(output, "     → Check for typos, missing quotes, etc.").ok();
    writeln!(output).ok();
    writeln!(output, "  3. A value failed validation").ok();
    writeln!(
        output,
        "     → The message below names the field and its allowed range"
    )
    .ok();
}

fn format_generic_error(output: &mut String, error: &str) {
    writeln!(output, "Tracker Error").ok();
    writeln!(output).ok();
    writeln!(output, "An error occurred while running the tracker.").ok();
    writeln!(output).ok();
    writeln!(output, "Error: {}", error).ok();
    writeln!(output).ok();
    writeln!(output, "Troubleshooting:").ok();
    writeln!(output).ok();
    writeln!(output, "  1. Check the device connections:").ok();
    writeln!(output, "     → Camera attached and not in use elsewhere").ok();
    writeln!(output, "     → IMU visible under /dev/ttyACM* or /dev/ttyUSB*").ok();
    writeln!(output).ok();
    writeln!(output, "  2. Try the minimal setup:").ok();
    writeln!(output, "     → glowtrack --no-imu").ok();
}
