//! Input actions built on an [`InputBackend`]
//!
//! The backend only knows how to emit single events. This module turns them
//! into the actions the tools expose: tweened moves, clicks, drags, typing
//! and shortcuts. Every action checks the fail-safe corners first and sleeps
//! for the configured pause once it completes.

use std::thread::sleep;
use std::time::Duration;

use crate::backend::{InputBackend, MouseButton, Press};
use crate::core::config::{
    DRAG_APPROACH_DURATION, MINIMUM_STEP_SLEEP, MINIMUM_TWEEN_DURATION, Settings,
};
use crate::core::error::{ActionError, ActionResult};
use crate::core::geometry::{Point, ScreenSize};
use crate::platform::PlatformAdapter;

/// How a piece of text reached the focused window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypingMode {
    /// One key event per character
    Keystrokes,
    /// Written to the clipboard and pasted
    Clipboard,
}

/// Intermediate cursor positions for a move from `start` to `end`
///
/// Returns the points to visit (the last is always `end`) and the sleep
/// before each one.
pub fn tween_path(start: Point, end: Point, duration: f64) -> (Vec<Point>, Duration) {
    let dx = i64::from(end.x) - i64::from(start.x);
    let dy = i64::from(end.y) - i64::from(start.y);
    let mut steps = dx.abs().max(dy.abs()) as usize;

    if duration < MINIMUM_TWEEN_DURATION || steps == 0 {
        return (vec![end], Duration::ZERO);
    }

    let mut step_sleep = duration / steps as f64;
    if step_sleep < MINIMUM_STEP_SLEEP {
        steps = ((duration / MINIMUM_STEP_SLEEP) as usize).max(1);
        step_sleep = duration / steps as f64;
    }

    let points = (1..=steps)
        .map(|i| {
            if i == steps {
                return end;
            }
            let t = i as f64 / steps as f64;
            Point::new(
                (f64::from(start.x) + dx as f64 * t).round() as i32,
                (f64::from(start.y) + dy as f64 * t).round() as i32,
            )
        })
        .collect();

    (points, Duration::from_secs_f64(step_sleep))
}

/// Drives one backend under one set of settings for the length of a tool call
pub struct Actuator<'a> {
    backend: &'a mut dyn InputBackend,
    settings: &'a Settings,
}

impl<'a> Actuator<'a> {
    pub fn new(backend: &'a mut dyn InputBackend, settings: &'a Settings) -> Self {
        Self { backend, settings }
    }

    pub fn screen_size(&self) -> ActionResult<ScreenSize> {
        self.backend.screen_size()
    }

    pub fn position(&self) -> ActionResult<Point> {
        self.backend.cursor_position()
    }

    /// Abort if the cursor sits on a fail-safe corner
    fn guard(&self) -> ActionResult<()> {
        if !self.settings.fail_safe {
            return Ok(());
        }
        let position = self.backend.cursor_position()?;
        if self.settings.trips_fail_safe(position) {
            tracing::warn!("Fail-safe triggered at {}", position);
            return Err(ActionError::FailSafeTriggered {
                x: position.x,
                y: position.y,
            });
        }
        Ok(())
    }

    fn pause(&self) {
        if !self.settings.pause.is_zero() {
            sleep(self.settings.pause);
        }
    }

    /// Move along a tweened path, checking the fail-safe at every step
    fn glide(&mut self, target: Point, duration: f64) -> ActionResult<()> {
        let start = self.backend.cursor_position()?;
        let (points, step_sleep) = tween_path(start, target, duration);
        let tweened = points.len() > 1;

        for point in points {
            if tweened {
                sleep(step_sleep);
            }
            // Landing on a corner on purpose must not abort this move
            if !self.settings.fail_safe_points.contains(&point) {
                self.guard()?;
            }
            self.backend.move_cursor(point)?;
        }
        Ok(())
    }

    /// Resolve optional coordinates against the cursor and clamp to the screen
    fn resolve(&self, x: Option<i32>, y: Option<i32>) -> ActionResult<Point> {
        let current = self.backend.cursor_position()?;
        let target = Point::new(x.unwrap_or(current.x), y.unwrap_or(current.y));
        Ok(self.backend.screen_size()?.clamp(target))
    }

    /// Move to an absolute position and report where the cursor ended up
    pub fn move_to(&mut self, target: Point, duration: f64) -> ActionResult<Point> {
        self.guard()?;
        let target = self.resolve(Some(target.x), Some(target.y))?;
        self.glide(target, duration)?;
        self.pause();
        self.position()
    }

    /// Move by an offset from the current position
    pub fn move_by(&mut self, dx: i32, dy: i32, duration: f64) -> ActionResult<Point> {
        let target = self.position()?.offset(dx, dy);
        self.move_to(target, duration)
    }

    /// Click `clicks` times, first moving to any coordinates given
    pub fn click(
        &mut self,
        x: Option<i32>,
        y: Option<i32>,
        button: MouseButton,
        clicks: u32,
    ) -> ActionResult<Point> {
        self.guard()?;
        if x.is_some() || y.is_some() {
            let target = self.resolve(x, y)?;
            self.backend.move_cursor(target)?;
        }
        for _ in 0..clicks {
            self.backend.button(button, Press::Click)?;
        }
        self.pause();
        self.position()
    }

    /// Scroll the wheel; positive clicks scroll up
    pub fn scroll(&mut self, clicks: i32, x: Option<i32>, y: Option<i32>) -> ActionResult<()> {
        self.guard()?;
        if x.is_some() || y.is_some() {
            let target = self.resolve(x, y)?;
            self.backend.move_cursor(target)?;
        }
        self.backend.scroll(clicks)?;
        self.pause();
        Ok(())
    }

    /// Press at `from`, glide to `to` holding `button`, release.
    ///
    /// A failure part way through leaves the button as it was at that point.
    pub fn drag(
        &mut self,
        from: Point,
        to: Point,
        duration: f64,
        button: MouseButton,
    ) -> ActionResult<()> {
        self.move_to(from, DRAG_APPROACH_DURATION)?;

        self.guard()?;
        let target = self.resolve(Some(to.x), Some(to.y))?;
        self.backend.button(button, Press::Down)?;
        self.glide(target, duration)?;
        self.backend.button(button, Press::Up)?;
        self.pause();
        Ok(())
    }

    /// Type ASCII text one key event per character
    pub fn write(&mut self, text: &str, interval: f64) -> ActionResult<()> {
        self.guard()?;
        let interval = Duration::from_secs_f64(interval.max(0.0));
        let mut buf = [0u8; 4];
        for c in text.chars() {
            self.backend.key(c.encode_utf8(&mut buf), Press::Click)?;
            if !interval.is_zero() {
                sleep(interval);
            }
            self.guard()?;
        }
        self.pause();
        Ok(())
    }

    /// Type any text, falling back to a clipboard paste for non-ASCII input
    pub fn type_text(
        &mut self,
        platform: &dyn PlatformAdapter,
        text: &str,
        interval: f64,
    ) -> ActionResult<TypingMode> {
        if text.is_ascii() {
            self.write(text, interval)?;
            return Ok(TypingMode::Keystrokes);
        }

        self.guard()?;
        tracing::debug!("Non-ASCII text, pasting via {} clipboard", platform.name());
        platform.copy_to_clipboard(text)?;
        self.hotkey(platform.paste_hotkey())?;
        Ok(TypingMode::Clipboard)
    }

    /// Press and release a key `presses` times
    pub fn press(&mut self, key: &str, presses: u32) -> ActionResult<()> {
        for _ in 0..presses {
            self.guard()?;
            self.backend.key(key, Press::Down)?;
            self.backend.key(key, Press::Up)?;
        }
        self.pause();
        Ok(())
    }

    /// Hold every key in order, then release them in reverse
    pub fn hotkey<S: AsRef<str>>(&mut self, keys: &[S]) -> ActionResult<()> {
        self.guard()?;
        for key in keys {
            self.backend.key(key.as_ref(), Press::Down)?;
        }
        for key in keys.iter().rev() {
            self.backend.key(key.as_ref(), Press::Up)?;
        }
        self.pause();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeDesktop, FakePlatform};

    fn settings() -> Settings {
        Settings::new(Duration::ZERO)
    }

    #[test]
    fn short_durations_move_instantly() {
        let (points, step_sleep) = tween_path(Point::new(0, 0), Point::new(300, 40), 0.05);
        assert_eq!(points, vec![Point::new(300, 40)]);
        assert_eq!(step_sleep, Duration::ZERO);
    }

    #[test]
    fn slow_moves_step_once_per_pixel() {
        let (points, step_sleep) = tween_path(Point::new(0, 0), Point::new(10, 5), 2.0);
        assert_eq!(points.len(), 10);
        assert_eq!(points.last(), Some(&Point::new(10, 5)));
        assert_eq!(step_sleep, Duration::from_millis(200));
    }

    #[test]
    fn fast_moves_are_throttled_to_minimum_sleep() {
        let (points, step_sleep) = tween_path(Point::new(0, 0), Point::new(100, 0), 1.0);
        assert_eq!(points.len(), 20);
        assert_eq!(points[9], Point::new(50, 0));
        assert!(step_sleep >= Duration::from_millis(49));
    }

    #[test]
    fn absolute_move_lands_on_target() {
        let desktop = FakeDesktop::new(1920, 1080);
        let mut backend = desktop.backend();
        let settings = settings();
        let mut actuator = Actuator::new(&mut backend, &settings);

        assert_eq!(actuator.move_to(Point::new(640, 480), 0.0).unwrap(), Point::new(640, 480));
        assert_eq!(actuator.position().unwrap(), Point::new(640, 480));
    }

    #[test]
    fn relative_moves_accumulate() {
        let desktop = FakeDesktop::new(1920, 1080);
        desktop.set_cursor(Point::new(100, 100));
        let mut backend = desktop.backend();
        let settings = settings();
        let mut actuator = Actuator::new(&mut backend, &settings);

        actuator.move_by(15, -20, 0.0).unwrap();
        let end = actuator.move_by(15, -20, 0.0).unwrap();
        assert_eq!(end, Point::new(130, 60));
    }

    #[test]
    fn moves_are_clamped_to_the_screen() {
        let desktop = FakeDesktop::new(800, 600);
        desktop.set_cursor(Point::new(10, 10));
        let mut backend = desktop.backend();
        let settings = settings();
        let mut actuator = Actuator::new(&mut backend, &settings);

        assert_eq!(actuator.move_to(Point::new(5000, -3), 0.0).unwrap(), Point::new(799, 0));
    }

    #[test]
    fn fail_safe_corner_aborts_before_any_event() {
        let desktop = FakeDesktop::new(800, 600);
        desktop.set_cursor(Point::new(0, 0));
        let mut backend = desktop.backend();
        let settings = settings();
        let mut actuator = Actuator::new(&mut backend, &settings);

        let err = actuator.click(Some(50), Some(50), MouseButton::Left, 1).unwrap_err();
        assert!(matches!(err, ActionError::FailSafeTriggered { x: 0, y: 0 }));
        desktop.calls().assert_not_called("button");
        desktop.calls().assert_not_called("move");
    }

    #[test]
    fn corner_reached_mid_move_aborts_the_glide() {
        let desktop = FakeDesktop::new(800, 600);
        desktop.set_cursor(Point::new(400, 400));
        desktop.park_at_corner_after(2);
        let mut backend = desktop.backend();
        let settings = settings();
        let mut actuator = Actuator::new(&mut backend, &settings);

        let err = actuator.move_to(Point::new(100, 100), 0.5).unwrap_err();
        assert!(matches!(err, ActionError::FailSafeTriggered { x: 0, y: 0 }));
        assert_eq!(desktop.calls().matching("move").len(), 2);
    }

    #[test]
    fn corner_reached_mid_drag_aborts_with_button_held() {
        let desktop = FakeDesktop::new(800, 600);
        desktop.set_cursor(Point::new(100, 100));
        desktop.park_at_corner_after(2);
        let mut backend = desktop.backend();
        let settings = settings();
        let mut actuator = Actuator::new(&mut backend, &settings);

        let err = actuator
            .drag(Point::new(100, 100), Point::new(300, 100), 0.5, MouseButton::Left)
            .unwrap_err();
        assert!(matches!(err, ActionError::FailSafeTriggered { x: 0, y: 0 }));
        desktop.calls().assert_called("button left down");
        desktop.calls().assert_not_called("button left up");
    }

    #[test]
    fn fail_safe_can_be_disabled() {
        let desktop = FakeDesktop::new(800, 600);
        desktop.set_cursor(Point::new(0, 0));
        let mut backend = desktop.backend();
        let settings = settings().with_fail_safe(false);
        let mut actuator = Actuator::new(&mut backend, &settings);

        actuator.press("enter", 1).unwrap();
        desktop.calls().assert_called("key enter down");
    }

    #[test]
    fn click_with_one_coordinate_keeps_the_other_axis() {
        let desktop = FakeDesktop::new(800, 600);
        desktop.set_cursor(Point::new(10, 20));
        let mut backend = desktop.backend();
        let settings = settings();
        let mut actuator = Actuator::new(&mut backend, &settings);

        let at = actuator.click(Some(300), None, MouseButton::Right, 2).unwrap();
        assert_eq!(at, Point::new(300, 20));
        assert_eq!(
            desktop.calls().matching("button"),
            vec!["button right click", "button right click"]
        );
    }

    #[test]
    fn drag_holds_the_button_across_the_glide() {
        let desktop = FakeDesktop::new(800, 600);
        desktop.set_cursor(Point::new(400, 400));
        let mut backend = desktop.backend();
        let settings = settings();
        let mut actuator = Actuator::new(&mut backend, &settings);

        actuator
            .drag(Point::new(100, 100), Point::new(200, 150), 0.1, MouseButton::Left)
            .unwrap();

        let calls = desktop.calls().dump();
        let down = calls.iter().position(|c| c == "button left down").unwrap();
        let up = calls.iter().position(|c| c == "button left up").unwrap();
        assert_eq!(calls[down - 1], "move 100,100");
        assert_eq!(calls[up - 1], "move 200,150");
        assert!(up - down > 2, "expected tween steps between press and release");
    }

    #[test]
    fn ascii_text_is_typed_per_character() {
        let desktop = FakeDesktop::new(800, 600);
        let platform = FakePlatform::new(desktop.calls());
        let mut backend = desktop.backend();
        let settings = settings();
        let mut actuator = Actuator::new(&mut backend, &settings);

        let mode = actuator.type_text(&platform, "hi\n", 0.0).unwrap();
        assert_eq!(mode, TypingMode::Keystrokes);
        assert_eq!(
            desktop.calls().matching("key"),
            vec!["key h click", "key i click", "key \n click"]
        );
        desktop.calls().assert_not_called("clipboard");
    }

    #[test]
    fn unicode_text_is_copied_then_pasted() {
        let desktop = FakeDesktop::new(800, 600);
        let platform = FakePlatform::new(desktop.calls());
        let mut backend = desktop.backend();
        let settings = settings();
        let mut actuator = Actuator::new(&mut backend, &settings);

        let mode = actuator.type_text(&platform, "naïve ☃", 0.0).unwrap();
        assert_eq!(mode, TypingMode::Clipboard);
        assert_eq!(
            desktop.calls().dump(),
            vec![
                "clipboard naïve ☃",
                "key ctrl down",
                "key v down",
                "key v up",
                "key ctrl up",
            ]
        );
    }

    #[test]
    fn failed_clipboard_write_skips_the_paste() {
        let desktop = FakeDesktop::new(800, 600);
        let platform = FakePlatform::new(desktop.calls()).failing();
        let mut backend = desktop.backend();
        let settings = settings();
        let mut actuator = Actuator::new(&mut backend, &settings);

        let err = actuator.type_text(&platform, "日本語", 0.0).unwrap_err();
        assert!(matches!(err, ActionError::Clipboard(_)));
        desktop.calls().assert_not_called("key");
    }

    #[test]
    fn hotkey_releases_in_reverse_order() {
        let desktop = FakeDesktop::new(800, 600);
        let mut backend = desktop.backend();
        let settings = settings();
        let mut actuator = Actuator::new(&mut backend, &settings);

        actuator.hotkey(&["ctrl", "shift", "t"]).unwrap();
        assert_eq!(
            desktop.calls().matching("key"),
            vec![
                "key ctrl down",
                "key shift down",
                "key t down",
                "key t up",
                "key shift up",
                "key ctrl up",
            ]
        );
    }

    #[test]
    fn unknown_key_surfaces_as_platform_error() {
        let desktop = FakeDesktop::new(800, 600);
        let mut backend = desktop.backend();
        let settings = settings();
        let mut actuator = Actuator::new(&mut backend, &settings);

        let err = actuator.press("hyperdrive", 1).unwrap_err();
        assert!(matches!(err, ActionError::UnknownKey(ref k) if k == "hyperdrive"));
    }
}
