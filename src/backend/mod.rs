//! Input backend abstraction
//!
//! This module provides a platform-agnostic interface over OS-level input
//! simulation, with an enigo-backed implementation for macOS, Windows and X11.

mod native;
pub mod keys;

use std::str::FromStr;
use std::sync::Arc;

use crate::core::error::{ActionError, ActionResult};
use crate::core::geometry::{Point, ScreenSize};

/// Mouse button accepted by the click and drag tools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

impl MouseButton {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Middle => "middle",
            Self::Right => "right",
        }
    }
}

impl FromStr for MouseButton {
    type Err = ActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Self::Left),
            "middle" => Ok(Self::Middle),
            "right" => Ok(Self::Right),
            other => Err(ActionError::invalid(
                "button",
                format!("expected 'left', 'middle' or 'right', got '{other}'"),
            )),
        }
    }
}

/// Which edge of a key or button event to emit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Press {
    Down,
    Up,
    Click,
}

/// Trait for input backend implementations
///
/// Implementations are driven from a blocking thread and need not be `Send`.
pub trait InputBackend {
    /// Logical size of the main display
    fn screen_size(&self) -> ActionResult<ScreenSize>;

    /// Current cursor position
    fn cursor_position(&self) -> ActionResult<Point>;

    /// Warp the cursor to an absolute position
    fn move_cursor(&mut self, to: Point) -> ActionResult<()>;

    fn button(&mut self, button: MouseButton, press: Press) -> ActionResult<()>;

    /// Scroll vertically; positive values scroll up
    fn scroll(&mut self, clicks: i32) -> ActionResult<()>;

    /// Emit an event for a key from the [`keys`] vocabulary
    fn key(&mut self, name: &str, press: Press) -> ActionResult<()>;
}

/// Opens a fresh backend for each tool call
pub type BackendFactory = Arc<dyn Fn() -> ActionResult<Box<dyn InputBackend>> + Send + Sync>;

/// Create the backend factory for the current environment
pub fn create_backend() -> BackendFactory {
    tracing::info!("Using enigo input backend ({})", std::env::consts::OS);
    Arc::new(|| -> ActionResult<Box<dyn InputBackend>> {
        Ok(Box::new(native::EnigoBackend::new()?))
    })
}
