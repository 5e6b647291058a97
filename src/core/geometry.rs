//! Positions and rectangles in the logical screen coordinate space
//!
//! Every positional tool, and the pixel grid of a reduced screenshot, share
//! this one coordinate space.

use std::fmt;

/// A point on screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Size of a display in logical units
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenSize {
    pub width: i32,
    pub height: i32,
}

impl ScreenSize {
    /// Clamp a point so it stays on the display
    pub fn clamp(&self, point: Point) -> Point {
        Point::new(
            point.x.clamp(0, (self.width - 1).max(0)),
            point.y.clamp(0, (self.height - 1).max(0)),
        )
    }
}

/// Rectangular capture region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// Assemble a region only when all four parts are present.
    ///
    /// A partial rectangle yields `None`, which callers treat as full screen.
    pub fn from_parts(
        x: Option<i32>,
        y: Option<i32>,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Option<Self> {
        Some(Self {
            x: x?,
            y: y?,
            width: width?,
            height: height?,
        })
    }

    /// Scale a logical region into physical pixels
    pub fn scaled(&self, factor: f32) -> Self {
        let factor = f64::from(factor);
        Self {
            x: (f64::from(self.x) * factor).round() as i32,
            y: (f64::from(self.y) * factor).round() as i32,
            width: (f64::from(self.width) * factor).round() as u32,
            height: (f64::from(self.height) * factor).round() as u32,
        }
    }
}
