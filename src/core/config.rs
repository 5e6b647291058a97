//! Dispatcher configuration
//!
//! Built once at startup from the command line and handed to the server.
//! Nothing in here changes after construction.

use std::time::Duration;

use crate::core::geometry::Point;

/// Moves shorter than this are performed instantly instead of tweened.
pub const MINIMUM_TWEEN_DURATION: f64 = 0.1;

/// Shortest sleep between two tween steps.
pub const MINIMUM_STEP_SLEEP: f64 = 0.05;

/// Drags faster than this are dropped by the macOS window server.
pub const MINIMUM_DRAG_DURATION: f64 = 0.1;

/// Duration of the approach move to a drag's start point.
pub const DRAG_APPROACH_DURATION: f64 = 0.1;

/// Immutable settings consulted by every input action
#[derive(Debug, Clone)]
pub struct Settings {
    /// Abort input actions while the cursor sits on a fail-safe corner
    pub fail_safe: bool,
    /// Corners that trigger the fail-safe
    pub fail_safe_points: Vec<Point>,
    /// Sleep after every completed action
    pub pause: Duration,
}

impl Settings {
    /// Settings with the fail-safe on and the given pause.
    pub fn new(pause: Duration) -> Self {
        Self {
            fail_safe: true,
            fail_safe_points: vec![Point::new(0, 0)],
            pause,
        }
    }

    pub fn with_fail_safe(mut self, enabled: bool) -> Self {
        self.fail_safe = enabled;
        self
    }

    /// Whether the cursor at `position` should abort the current action
    pub fn trips_fail_safe(&self, position: Point) -> bool {
        self.fail_safe && self.fail_safe_points.contains(&position)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}
