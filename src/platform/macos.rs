//! macOS permission priming
//!
//! Accessibility trust is checked without prompting; if missing, System
//! Settings is opened on the right pane. Screen Recording access is never tested,
//! because the check itself raises the system dialog on macOS 15 and later.

use std::process::Command;

const ACCESSIBILITY_PANE: &str =
    "x-apple.systempreferences:com.apple.preference.security?Privacy_Accessibility";

pub fn prime_permissions() {
    // SAFETY: AXIsProcessTrusted takes no arguments and only reads process state.
    let trusted = unsafe { accessibility_sys::AXIsProcessTrusted() };

    if trusted {
        tracing::debug!("Accessibility permission granted");
    } else {
        tracing::warn!(
            "Accessibility permission required. Opening System Settings; grant access, then restart."
        );
        if let Err(e) = Command::new("open").arg(ACCESSIBILITY_PANE).spawn() {
            tracing::warn!("Failed to open System Settings: {}", e);
        }
    }

    tracing::info!(
        "Tip: if screenshots fail, grant Screen Recording permission in System Settings \
         > Privacy & Security > Screen & System Audio Recording, then restart."
    );
}
