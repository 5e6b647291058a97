//! Platform adapters
//!
//! Everything that differs per operating system beyond raw input events lives
//! here: the native clipboard command used for the paste fallback, the paste
//! shortcut, and startup permission priming. One adapter is selected at
//! startup from the OS name.

#[cfg(target_os = "macos")]
mod macos;

use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::Arc;

use crate::core::error::{ActionError, ActionResult};

/// How a clipboard command expects its stdin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEncoding {
    Utf8,
    Utf16Le,
}

impl TextEncoding {
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Self::Utf8 => text.as_bytes().to_vec(),
            Self::Utf16Le => text.encode_utf16().flat_map(u16::to_le_bytes).collect(),
        }
    }
}

/// A native command that reads text on stdin and places it on the clipboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardCommand {
    pub program: &'static str,
    pub args: &'static [&'static str],
    pub encoding: TextEncoding,
}

impl ClipboardCommand {
    /// Run the command and fail unless it exits successfully
    pub fn copy(&self, text: &str) -> ActionResult<()> {
        let mut child = Command::new(self.program)
            .args(self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| ActionError::Clipboard(format!("failed to run {}: {e}", self.program)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&self.encoding.encode(text))
                .map_err(|e| ActionError::Clipboard(format!("{}: {e}", self.program)))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| ActionError::Clipboard(format!("{}: {e}", self.program)))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ActionError::Clipboard(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }
}

/// Per-OS behaviour that is not plain input simulation
pub trait PlatformAdapter: Send + Sync {
    /// OS name as reported by the standard library
    fn name(&self) -> &str;

    /// Command used by the paste fallback, if this OS has one
    fn clipboard_command(&self) -> Option<ClipboardCommand>;

    /// Shortcut that pastes the clipboard into the focused window
    fn paste_hotkey(&self) -> &'static [&'static str] {
        &["ctrl", "v"]
    }

    /// Put `text` on the system clipboard
    fn copy_to_clipboard(&self, text: &str) -> ActionResult<()> {
        match self.clipboard_command() {
            Some(command) => command.copy(text),
            None => Err(ActionError::UnsupportedPlatform(self.name().to_string())),
        }
    }

    /// Best-effort startup step; never fails and is never waited on
    fn prime_permissions(&self) {}
}

pub struct MacOs;

impl PlatformAdapter for MacOs {
    fn name(&self) -> &str {
        "macos"
    }

    fn clipboard_command(&self) -> Option<ClipboardCommand> {
        Some(ClipboardCommand {
            program: "pbcopy",
            args: &[],
            encoding: TextEncoding::Utf8,
        })
    }

    fn paste_hotkey(&self) -> &'static [&'static str] {
        &["command", "v"]
    }

    fn prime_permissions(&self) {
        #[cfg(target_os = "macos")]
        macos::prime_permissions();
    }
}

pub struct Linux;

impl PlatformAdapter for Linux {
    fn name(&self) -> &str {
        "linux"
    }

    fn clipboard_command(&self) -> Option<ClipboardCommand> {
        Some(ClipboardCommand {
            program: "xclip",
            args: &["-selection", "clipboard"],
            encoding: TextEncoding::Utf8,
        })
    }
}

pub struct Windows;

impl PlatformAdapter for Windows {
    fn name(&self) -> &str {
        "windows"
    }

    fn clipboard_command(&self) -> Option<ClipboardCommand> {
        Some(ClipboardCommand {
            program: "clip",
            args: &[],
            encoding: TextEncoding::Utf16Le,
        })
    }
}

/// Any OS without a known clipboard command
pub struct Unsupported(pub String);

impl PlatformAdapter for Unsupported {
    fn name(&self) -> &str {
        &self.0
    }

    fn clipboard_command(&self) -> Option<ClipboardCommand> {
        None
    }
}

/// Pick the adapter for an OS name
pub fn for_os(os: &str) -> Arc<dyn PlatformAdapter> {
    match os {
        "macos" => Arc::new(MacOs),
        "linux" => Arc::new(Linux),
        "windows" => Arc::new(Windows),
        other => Arc::new(Unsupported(other.to_string())),
    }
}

/// Adapter for the OS this process runs on
pub fn detect() -> Arc<dyn PlatformAdapter> {
    for_os(std::env::consts::OS)
}
