//! Input simulation via enigo
//!
//! enigo talks to CGEvent on macOS, SendInput on Windows and XTest on X11.
//! The handle is not `Send` on macOS, so one is opened per tool call on the
//! blocking thread that runs it.

use enigo::{Axis, Button, Coordinate, Direction, Enigo, Keyboard, Mouse, Settings};

use super::{InputBackend, MouseButton, Press, keys};
use crate::core::error::{ActionError, ActionResult};
use crate::core::geometry::{Point, ScreenSize};

pub struct EnigoBackend {
    enigo: Enigo,
}

impl EnigoBackend {
    pub fn new() -> ActionResult<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|e| ActionError::Input(format!("no input session available: {e}")))?;
        Ok(Self { enigo })
    }
}

fn direction(press: Press) -> Direction {
    match press {
        Press::Down => Direction::Press,
        Press::Up => Direction::Release,
        Press::Click => Direction::Click,
    }
}

fn input_err(e: enigo::InputError) -> ActionError {
    ActionError::Input(e.to_string())
}

impl InputBackend for EnigoBackend {
    fn screen_size(&self) -> ActionResult<ScreenSize> {
        let (width, height) = self.enigo.main_display().map_err(input_err)?;
        Ok(ScreenSize { width, height })
    }

    fn cursor_position(&self) -> ActionResult<Point> {
        let (x, y) = self.enigo.location().map_err(input_err)?;
        Ok(Point::new(x, y))
    }

    fn move_cursor(&mut self, to: Point) -> ActionResult<()> {
        self.enigo
            .move_mouse(to.x, to.y, Coordinate::Abs)
            .map_err(input_err)
    }

    fn button(&mut self, button: MouseButton, press: Press) -> ActionResult<()> {
        let button = match button {
            MouseButton::Left => Button::Left,
            MouseButton::Middle => Button::Middle,
            MouseButton::Right => Button::Right,
        };
        self.enigo.button(button, direction(press)).map_err(input_err)
    }

    fn scroll(&mut self, clicks: i32) -> ActionResult<()> {
        // enigo scrolls down for positive lengths
        self.enigo
            .scroll(-clicks, Axis::Vertical)
            .map_err(input_err)
    }

    fn key(&mut self, name: &str, press: Press) -> ActionResult<()> {
        let key = keys::lookup(name).ok_or_else(|| ActionError::UnknownKey(name.to_string()))?;
        tracing::trace!("enigo key {:?} {:?}", key, press);
        self.enigo.key(key, direction(press)).map_err(input_err)
    }
}
