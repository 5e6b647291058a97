//! MCP Server implementation for Stagehand
//!
//! This module implements the Model Context Protocol server that exposes
//! desktop control tools to AI assistants. Each tool validates its
//! parameters, then runs its OS calls on a blocking thread. Calls are
//! executed strictly one at a time.

use base64::Engine as _;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{tool::ToolRouter, wrapper::Parameters},
    model::*,
    schemars, serde, tool, tool_handler, tool_router,
};
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::backend::{BackendFactory, MouseButton};
use crate::core::config::{MINIMUM_DRAG_DURATION, Settings};
use crate::core::error::{ActionError, ActionResult, ensure_at_least_one, ensure_duration};
use crate::core::geometry::{Point, Region};
use crate::input::Actuator;
use crate::platform::PlatformAdapter;
use crate::screenshot::{MonitorCapture, ScreenCapture};

/// Parameters for move_mouse tool
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct MoveMouseParams {
    /// Target X coordinate
    pub x: i32,
    /// Target Y coordinate
    pub y: i32,
    /// If true, move relative to the current position instead of absolute
    #[serde(default)]
    pub relative: bool,
    /// Duration of the movement in seconds (0 = instant)
    #[serde(default = "default_move_duration")]
    pub duration: f64,
}

fn default_move_duration() -> f64 {
    0.25
}

impl MoveMouseParams {
    fn validate(&self) -> ActionResult<()> {
        ensure_duration("duration", self.duration, 0.0)
    }
}

/// Parameters for click tool
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ClickParams {
    /// X coordinate to click (omit for the current position)
    #[serde(default)]
    pub x: Option<i32>,
    /// Y coordinate to click (omit for the current position)
    #[serde(default)]
    pub y: Option<i32>,
    /// Mouse button: "left" (default), "middle", "right"
    #[serde(default = "default_button")]
    pub button: String,
    /// Number of clicks (2 = double-click)
    #[serde(default = "default_count")]
    pub clicks: u32,
}

fn default_button() -> String {
    "left".to_string()
}

fn default_count() -> u32 {
    1
}

impl ClickParams {
    fn validate(&self) -> ActionResult<MouseButton> {
        ensure_at_least_one("clicks", self.clicks)?;
        self.button.parse()
    }
}

/// Parameters for scroll tool
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ScrollParams {
    /// Number of scroll clicks. Positive = up, negative = down
    pub clicks: i32,
    /// X coordinate to scroll at (omit for the current position)
    #[serde(default)]
    pub x: Option<i32>,
    /// Y coordinate to scroll at (omit for the current position)
    #[serde(default)]
    pub y: Option<i32>,
}

/// Parameters for drag tool
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct DragParams {
    /// Starting X coordinate
    pub start_x: i32,
    /// Starting Y coordinate
    pub start_y: i32,
    /// Ending X coordinate
    pub end_x: i32,
    /// Ending Y coordinate
    pub end_y: i32,
    /// Duration of the drag in seconds (minimum 0.1; instant drags fail on macOS)
    #[serde(default = "default_drag_duration")]
    pub duration: f64,
    /// Mouse button to hold during the drag
    #[serde(default = "default_button")]
    pub button: String,
}

fn default_drag_duration() -> f64 {
    0.5
}

impl DragParams {
    fn validate(&self) -> ActionResult<MouseButton> {
        ensure_duration("duration", self.duration, MINIMUM_DRAG_DURATION)?;
        self.button.parse()
    }
}

/// Parameters for type_text tool
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct TypeTextParams {
    /// Text to type
    pub text: String,
    /// Seconds between each keystroke
    #[serde(default = "default_interval")]
    pub interval: f64,
}

fn default_interval() -> f64 {
    0.02
}

impl TypeTextParams {
    fn validate(&self) -> ActionResult<()> {
        ensure_duration("interval", self.interval, 0.0)
    }
}

/// Parameters for press_key tool
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct PressKeyParams {
    /// Key to press, e.g. "enter", "tab", "escape", "space", "backspace", "delete",
    /// "up", "down", "left", "right", "home", "end", "pageup", "pagedown",
    /// "f1"-"f12", "a"-"z", "0"-"9"
    pub key: String,
    /// Number of times to press the key
    #[serde(default = "default_count")]
    pub presses: u32,
}

impl PressKeyParams {
    fn validate(&self) -> ActionResult<()> {
        ensure_at_least_one("presses", self.presses)
    }
}

/// Parameters for hotkey tool
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct HotkeyParams {
    /// Keys to press together, e.g. ["command", "c"] for Cmd+C or
    /// ["ctrl", "shift", "t"] for Ctrl+Shift+T
    pub keys: Vec<String>,
}

impl HotkeyParams {
    fn validate(&self) -> ActionResult<()> {
        if self.keys.is_empty() {
            return Err(ActionError::invalid("keys", "at least one key is required"));
        }
        Ok(())
    }
}

/// Parameters for screenshot tool
#[derive(Debug, serde::Deserialize, schemars::JsonSchema)]
pub struct ScreenshotParams {
    /// X coordinate of the top-left corner of the capture region
    #[serde(default)]
    pub region_x: Option<i32>,
    /// Y coordinate of the top-left corner of the capture region
    #[serde(default)]
    pub region_y: Option<i32>,
    /// Width of the capture region
    #[serde(default)]
    pub region_width: Option<u32>,
    /// Height of the capture region
    #[serde(default)]
    pub region_height: Option<u32>,
    /// Halve the screenshot dimensions to save tokens. Recommended for
    /// Retina/HiDPI displays; set to false for pixel-perfect captures
    #[serde(default = "default_reduce")]
    pub reduce_resolution: bool,
}

fn default_reduce() -> bool {
    true
}

/// Turn an action outcome into a tool result
///
/// Parameter problems become protocol errors naming the field; everything
/// else is reported inside the tool result so the caller can read it.
fn respond(tool: &str, result: ActionResult<String>) -> Result<CallToolResult, McpError> {
    match result {
        Ok(text) => Ok(CallToolResult::success(vec![Content::text(text)])),
        Err(ActionError::InvalidParameter { field, reason }) => Err(McpError::invalid_params(
            format!("invalid parameter '{field}': {reason}"),
            Some(json!({ "field": field })),
        )),
        Err(e) => {
            tracing::warn!("{} failed: {}", tool, e);
            Ok(CallToolResult::error(vec![Content::text(
                json!({
                    "error": e.summary(),
                    "details": e.to_string()
                })
                .to_string(),
            )]))
        }
    }
}

/// Stagehand MCP Server
///
/// Provides desktop control tools for AI assistants.
#[derive(Clone)]
pub struct DesktopServer {
    settings: Arc<Settings>,
    /// Opens the OS input backend for each call
    backend: BackendFactory,
    platform: Arc<dyn PlatformAdapter>,
    capture: Arc<dyn ScreenCapture>,
    /// Held for the whole of every tool call
    turn: Arc<Mutex<()>>,
    /// MCP tool router
    tool_router: ToolRouter<DesktopServer>,
}

#[tool_router]
impl DesktopServer {
    /// Create a server wired to the real desktop
    pub fn new(settings: Settings, platform: Arc<dyn PlatformAdapter>) -> Self {
        Self::with_parts(
            settings,
            crate::backend::create_backend(),
            platform,
            Arc::new(MonitorCapture),
        )
    }

    pub fn with_parts(
        settings: Settings,
        backend: BackendFactory,
        platform: Arc<dyn PlatformAdapter>,
        capture: Arc<dyn ScreenCapture>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            backend,
            platform,
            capture,
            turn: Arc::new(Mutex::new(())),
            tool_router: Self::tool_router(),
        }
    }

    /// Run `action` against a fresh backend on a blocking thread
    async fn run<T, F>(&self, action: F) -> ActionResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Actuator<'_>, &dyn PlatformAdapter) -> ActionResult<T> + Send + 'static,
    {
        // The blocking task owns the turn, so a cancelled call keeps it until
        // its input has actually finished
        let turn = self.turn.clone().lock_owned().await;
        let factory = self.backend.clone();
        let settings = self.settings.clone();
        let platform = self.platform.clone();

        tokio::task::spawn_blocking(move || {
            let _turn = turn;
            let mut backend = factory()?;
            let mut actuator = Actuator::new(backend.as_mut(), &settings);
            action(&mut actuator, platform.as_ref())
        })
        .await
        .map_err(|e| ActionError::Input(format!("input task failed: {e}")))?
    }

    #[tool(description = "Get the screen dimensions. Returns the logical resolution (not physical pixels on Retina/HiDPI displays); all coordinate-based tools use this same coordinate space.")]
    async fn get_screen_size(&self) -> Result<CallToolResult, McpError> {
        let result = self
            .run(|actuator, _| actuator.screen_size())
            .await
            .map(|size| format!("Screen size: {}x{}", size.width, size.height));
        respond("get_screen_size", result)
    }

    #[tool(description = "Get the current mouse cursor position in logical screen coordinates.")]
    async fn get_mouse_position(&self) -> Result<CallToolResult, McpError> {
        let result = self
            .run(|actuator, _| actuator.position())
            .await
            .map(|p| format!("Mouse position: x={}, y={}", p.x, p.y));
        respond("get_mouse_position", result)
    }

    #[tool(description = "Move the mouse cursor. Coordinates are in logical screen space; screenshot pixels (with reduce_resolution on Retina displays) map 1:1 onto them.")]
    async fn move_mouse(
        &self,
        params: Parameters<MoveMouseParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        tracing::debug!("move_mouse {:?}", params);
        if let Err(e) = params.validate() {
            return respond("move_mouse", Err(e));
        }

        let result = self
            .run(move |actuator, _| {
                if params.relative {
                    actuator.move_by(params.x, params.y, params.duration)
                } else {
                    actuator.move_to(Point::new(params.x, params.y), params.duration)
                }
            })
            .await
            .map(|p| format!("Moved mouse to {}", p));
        respond("move_mouse", result)
    }

    #[tool(description = "Click the mouse. If x/y are omitted, clicks at the current cursor position.")]
    async fn click(&self, params: Parameters<ClickParams>) -> Result<CallToolResult, McpError> {
        let params = params.0;
        tracing::debug!("click {:?}", params);
        let button = match params.validate() {
            Ok(button) => button,
            Err(e) => return respond("click", Err(e)),
        };

        let clicks = params.clicks;
        let result = self
            .run(move |actuator, _| actuator.click(params.x, params.y, button, clicks))
            .await
            .map(|p| {
                let click_type = if clicks == 2 { "Double-clicked" } else { "Clicked" };
                format!("{} {} button at {}", click_type, button.as_str(), p)
            });
        respond("click", result)
    }

    #[tool(description = "Scroll the mouse wheel. Positive clicks scroll up, negative scroll down. If x/y are omitted, scrolls at the current cursor position.")]
    async fn scroll(&self, params: Parameters<ScrollParams>) -> Result<CallToolResult, McpError> {
        let params = params.0;
        tracing::debug!("scroll {:?}", params);

        let ScrollParams { clicks, x, y } = params;
        let result = self
            .run(move |actuator, _| actuator.scroll(clicks, x, y))
            .await
            .map(|()| {
                let direction = if clicks > 0 { "up" } else { "down" };
                let at = match (x, y) {
                    (Some(x), Some(y)) => Point::new(x, y).to_string(),
                    _ => "current position".to_string(),
                };
                format!("Scrolled {} {} clicks at {}", direction, clicks.unsigned_abs(), at)
            });
        respond("scroll", result)
    }

    #[tool(description = "Drag the mouse from one position to another: moves to the start, holds the button, moves to the end, releases. Duration must be >= 0.1s because instant drags fail on macOS.")]
    async fn drag(&self, params: Parameters<DragParams>) -> Result<CallToolResult, McpError> {
        let params = params.0;
        tracing::debug!("drag {:?}", params);
        let button = match params.validate() {
            Ok(button) => button,
            Err(e) => return respond("drag", Err(e)),
        };

        let from = Point::new(params.start_x, params.start_y);
        let to = Point::new(params.end_x, params.end_y);
        let duration = params.duration;
        let result = self
            .run(move |actuator, _| actuator.drag(from, to, duration, button))
            .await
            .map(|()| format!("Dragged from {} to {}", from, to));
        respond("drag", result)
    }

    #[tool(description = "Type a text string. ASCII text is typed key by key; text with non-ASCII characters (accents, emoji, CJK) is pasted through the clipboard.")]
    async fn type_text(
        &self,
        params: Parameters<TypeTextParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        tracing::debug!("type_text ({} chars)", params.text.chars().count());
        if let Err(e) = params.validate() {
            return respond("type_text", Err(e));
        }

        let count = params.text.chars().count();
        let result = self
            .run(move |actuator, platform| {
                actuator.type_text(platform, &params.text, params.interval)
            })
            .await
            .map(|mode| {
                tracing::debug!("typed via {:?}", mode);
                format!("Typed {} characters", count)
            });
        respond("type_text", result)
    }

    #[tool(description = "Press a keyboard key one or more times. Use for special keys (Enter, Tab, arrows, function keys); use type_text for regular text.")]
    async fn press_key(
        &self,
        params: Parameters<PressKeyParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        tracing::debug!("press_key {:?}", params);
        if let Err(e) = params.validate() {
            return respond("press_key", Err(e));
        }

        let PressKeyParams { key, presses } = params;
        let label = key.clone();
        let result = self
            .run(move |actuator, _| actuator.press(&key, presses))
            .await
            .map(|()| {
                if presses > 1 {
                    format!("Pressed '{}' {} times", label, presses)
                } else {
                    format!("Pressed '{}'", label)
                }
            });
        respond("press_key", result)
    }

    #[tool(description = "Press a key combination. Keys are pressed in order and released in reverse order. On macOS use 'command' for Cmd; on Windows/Linux use 'ctrl'.")]
    async fn hotkey(&self, params: Parameters<HotkeyParams>) -> Result<CallToolResult, McpError> {
        let params = params.0;
        tracing::debug!("hotkey {:?}", params);
        if let Err(e) = params.validate() {
            return respond("hotkey", Err(e));
        }

        let combo = params.keys.join("+");
        let result = self
            .run(move |actuator, _| actuator.hotkey(params.keys.as_slice()))
            .await
            .map(|()| format!("Pressed hotkey: {}", combo));
        respond("hotkey", result)
    }

    #[tool(description = "Take a screenshot of the screen or of a region (all four region fields are needed, otherwise the full screen is captured). Resolution is halved by default; the returned pixels map 1:1 to the logical coordinates used by the other tools.")]
    async fn screenshot(
        &self,
        params: Parameters<ScreenshotParams>,
    ) -> Result<CallToolResult, McpError> {
        let params = params.0;
        tracing::debug!("screenshot {:?}", params);

        let region = Region::from_parts(
            params.region_x,
            params.region_y,
            params.region_width,
            params.region_height,
        );
        let reduce = params.reduce_resolution;

        let _turn = self.turn.lock().await;
        let png = match self.capture.capture(region).await {
            Ok(image) => tokio::task::spawn_blocking(move || {
                crate::screenshot::encode_png(&image, reduce)
            })
            .await
            .unwrap_or_else(|e| Err(ActionError::Capture(format!("encode task failed: {e}")))),
            Err(e) => Err(ActionError::Capture(e.to_string())),
        };

        match png {
            Ok(png) => {
                let data = base64::engine::general_purpose::STANDARD.encode(&png);
                Ok(CallToolResult::success(vec![Content::image(data, "image/png")]))
            }
            Err(e) => respond("screenshot", Err(e)),
        }
    }
}

#[tool_handler]
impl ServerHandler for DesktopServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Full desktop control: mouse, keyboard, screenshots, and screen info. \
                 Use get_screen_size for the coordinate bounds and screenshot to look \
                 before clicking. Move the cursor to the top-left corner to abort \
                 input actions."
                    .to_string(),
            ),
        }
    }
}
