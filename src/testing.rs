//! Recording fakes for the OS seams, shared by unit tests

use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use image::RgbaImage;

use crate::backend::{BackendFactory, InputBackend, MouseButton, Press, keys};
use crate::core::error::{ActionError, ActionResult};
use crate::core::geometry::{Point, Region, ScreenSize};
use crate::platform::{ClipboardCommand, PlatformAdapter};
use crate::screenshot::ScreenCapture;

#[derive(Clone, Default)]
pub struct Calls {
    inner: Arc<RwLock<Vec<String>>>,
}

impl Calls {
    pub fn push<S: Into<String>>(&self, call: S) {
        self.inner.write().unwrap().push(call.into());
    }

    pub fn contains_prefix(&self, prefix: &str) -> bool {
        self.inner
            .read()
            .unwrap()
            .iter()
            .any(|c| c.starts_with(prefix))
    }

    pub fn assert_called(&self, prefix: &str) {
        assert!(
            self.contains_prefix(prefix),
            "Expected call starting with '{}', but not found in {:?}",
            prefix,
            self.dump()
        );
    }

    pub fn assert_not_called(&self, prefix: &str) {
        assert!(
            !self.contains_prefix(prefix),
            "Did not expect call starting with '{}', but found in {:?}",
            prefix,
            self.dump()
        );
    }

    /// Calls starting with `prefix`, in order
    pub fn matching(&self, prefix: &str) -> Vec<String> {
        self.inner
            .read()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .cloned()
            .collect()
    }

    pub fn dump(&self) -> Vec<String> {
        self.inner.read().unwrap().clone()
    }
}

/// A pretend display whose cursor survives across backend instances
#[derive(Clone)]
pub struct FakeDesktop {
    calls: Calls,
    cursor: Arc<Mutex<Point>>,
    /// Operator parks the cursor at (0,0) after this many warps
    corner_after: Arc<Mutex<Option<usize>>>,
    size: ScreenSize,
}

impl FakeDesktop {
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            calls: Calls::default(),
            cursor: Arc::new(Mutex::new(Point::new(width / 2, height / 2))),
            corner_after: Arc::new(Mutex::new(None)),
            size: ScreenSize { width, height },
        }
    }

    pub fn calls(&self) -> Calls {
        self.calls.clone()
    }

    pub fn set_cursor(&self, at: Point) {
        *self.cursor.lock().unwrap() = at;
    }

    /// Simulate the operator slamming the cursor into the top-left corner
    /// once `moves` warps have happened
    pub fn park_at_corner_after(&self, moves: usize) {
        *self.corner_after.lock().unwrap() = Some(moves);
    }

    pub fn backend(&self) -> FakeBackend {
        FakeBackend {
            desktop: self.clone(),
        }
    }

    pub fn factory(&self) -> BackendFactory {
        let desktop = self.clone();
        Arc::new(move || -> ActionResult<Box<dyn InputBackend>> {
            Ok(Box::new(desktop.backend()))
        })
    }
}

pub struct FakeBackend {
    desktop: FakeDesktop,
}

fn press_name(press: Press) -> &'static str {
    match press {
        Press::Down => "down",
        Press::Up => "up",
        Press::Click => "click",
    }
}

impl InputBackend for FakeBackend {
    fn screen_size(&self) -> ActionResult<ScreenSize> {
        Ok(self.desktop.size)
    }

    fn cursor_position(&self) -> ActionResult<Point> {
        Ok(*self.desktop.cursor.lock().unwrap())
    }

    fn move_cursor(&mut self, to: Point) -> ActionResult<()> {
        self.desktop.calls.push(format!("move {},{}", to.x, to.y));
        self.desktop.set_cursor(to);
        let mut corner_after = self.desktop.corner_after.lock().unwrap();
        if let Some(remaining) = corner_after.as_mut() {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                *corner_after = None;
                self.desktop.set_cursor(Point::new(0, 0));
            }
        }
        Ok(())
    }

    fn button(&mut self, button: MouseButton, press: Press) -> ActionResult<()> {
        self.desktop
            .calls
            .push(format!("button {} {}", button.as_str(), press_name(press)));
        Ok(())
    }

    fn scroll(&mut self, clicks: i32) -> ActionResult<()> {
        self.desktop.calls.push(format!("scroll {clicks}"));
        Ok(())
    }

    fn key(&mut self, name: &str, press: Press) -> ActionResult<()> {
        if keys::lookup(name).is_none() {
            return Err(ActionError::UnknownKey(name.to_string()));
        }
        self.desktop
            .calls
            .push(format!("key {} {}", name, press_name(press)));
        Ok(())
    }
}

/// Platform adapter that records clipboard writes instead of running a command
pub struct FakePlatform {
    calls: Calls,
    fail_copy: bool,
}

impl FakePlatform {
    pub fn new(calls: Calls) -> Self {
        Self {
            calls,
            fail_copy: false,
        }
    }

    pub fn failing(mut self) -> Self {
        self.fail_copy = true;
        self
    }
}

impl PlatformAdapter for FakePlatform {
    fn name(&self) -> &str {
        "fake"
    }

    fn clipboard_command(&self) -> Option<ClipboardCommand> {
        None
    }

    fn copy_to_clipboard(&self, text: &str) -> ActionResult<()> {
        if self.fail_copy {
            return Err(ActionError::Clipboard("copy command exited with 1".to_string()));
        }
        self.calls.push(format!("clipboard {text}"));
        Ok(())
    }
}

/// Returns blank frames sized like the requested region
pub struct FakeCapture {
    pub calls: Calls,
    pub width: u32,
    pub height: u32,
}

#[async_trait]
impl ScreenCapture for FakeCapture {
    async fn capture(&self, region: Option<Region>) -> anyhow::Result<RgbaImage> {
        self.calls.push(format!("capture {:?}", region));
        Ok(match region {
            Some(region) => RgbaImage::new(region.width, region.height),
            None => RgbaImage::new(self.width, self.height),
        })
    }
}
