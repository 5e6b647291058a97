//! Errors raised while executing a desktop action

use thiserror::Error;

pub type ActionResult<T> = std::result::Result<T, ActionError>;

#[derive(Debug, Error)]
pub enum ActionError {
    /// A parameter is outside its declared range; raised before any OS call.
    #[error("invalid parameter '{field}': {reason}")]
    InvalidParameter { field: &'static str, reason: String },

    /// The operator parked the cursor on a fail-safe corner.
    #[error("fail-safe triggered: cursor at ({x}, {y}); move it away from the screen corner to continue")]
    FailSafeTriggered { x: i32, y: i32 },

    #[error("input simulation failed: {0}")]
    Input(String),

    #[error("unrecognized key name: '{0}'")]
    UnknownKey(String),

    #[error("clipboard write failed: {0}")]
    Clipboard(String),

    #[error("unsupported platform for clipboard paste: {0}")]
    UnsupportedPlatform(String),

    #[error("screen capture failed: {0}")]
    Capture(String),

    #[error("failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
}

impl ActionError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            field,
            reason: reason.into(),
        }
    }

    /// Short label used as the `error` field of a failed tool result
    pub fn summary(&self) -> &'static str {
        match self {
            Self::InvalidParameter { .. } => "Invalid parameter",
            Self::FailSafeTriggered { .. } => "Fail-safe triggered",
            Self::Input(_) | Self::UnknownKey(_) => "Input simulation failed",
            Self::Clipboard(_) | Self::UnsupportedPlatform(_) => "Clipboard paste failed",
            Self::Capture(_) | Self::Encode(_) => "Failed to capture screenshot",
        }
    }
}

/// Reject negative, NaN or infinite durations
pub fn ensure_duration(field: &'static str, value: f64, minimum: f64) -> ActionResult<()> {
    if !value.is_finite() {
        return Err(ActionError::invalid(field, "must be a finite number"));
    }
    if value < minimum {
        return Err(ActionError::invalid(
            field,
            format!("must be >= {minimum}, got {value}"),
        ));
    }
    Ok(())
}

pub fn ensure_at_least_one(field: &'static str, value: u32) -> ActionResult<()> {
    if value < 1 {
        return Err(ActionError::invalid(field, format!("must be >= 1, got {value}")));
    }
    Ok(())
}
