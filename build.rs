//! Build script for glowtrack
//!
//! Stamps the binary with build date, time and git revision for the
//! startup banner.

use std::process::Command;

fn main() {
    println!("cargo:rustc-env=BUILD_DATE={}", stamp("date", &["+%Y-%m-%d"]));
    println!("cargo:rustc-env=BUILD_TIME={}", stamp("date", &["+%H:%M:%S"]));
    println!(
        "cargo:rustc-env=GIT_HASH={}",
        stamp("git", &["rev-parse", "--short", "HEAD"])
    );

    // Rebuild on commit so the banner hash stays honest
    println!("cargo:rerun-if-changed=.git/HEAD");
}

/// Trimmed stdout of a command, "unknown" when it fails or prints nothing
fn stamp(program: &str, args: &[&str]) -> String {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "unknown".to_string())
}
