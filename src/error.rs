// src/error.rs
// Error taxonomy for Vision Belt. Fatal errors (configuration, stream start, broken
// stream) surface as `BeltError`; per-tick conditions have their own types so the
// acquisition loop can skip a tick without ever escalating them.

use thiserror::Error;

use crate::core::state::LoopState;

/// Invalid or missing configuration. Raised once at startup, before the loop runs.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required value was absent from the settings file
    #[error("missing required setting `{field}`")]
    Missing { field: &'static str },

    /// A numeric value that must be strictly positive was not
    #[error("setting `{field}` must be positive, got {value}")]
    NonPositive { field: &'static str, value: f64 },

    /// Depth is aligned onto the color stream, so both must share one frame size
    #[error("color stream is {color_width}x{color_height} but depth stream is {depth_width}x{depth_height}; aligned frames need one geometry")]
    GeometryMismatch {
        depth_width: u32,
        depth_height: u32,
        color_width: u32,
        color_height: u32,
    },

    /// An integer setting does not fit the range the camera accepts
    #[error("setting `{field}` is out of range: {value}")]
    OutOfRange { field: &'static str, value: i64 },

    /// The settings file could not be read
    #[error("cannot read settings file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid YAML for the expected layout
    #[error("malformed settings: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Failure reported by a frame source.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FrameError {
    /// No usable frame this tick (timeout, dropped frame). The loop skips the tick.
    #[error("frame unavailable: {0}")]
    Unavailable(String),

    /// The stream itself is broken or closed. The loop stops.
    #[error("stream failure: {0}")]
    Fatal(String),
}

/// Failure reported by a haptic or speech collaborator. Never stops the loop.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{channel} dispatch failed: {reason}")]
pub struct DispatchError {
    /// `haptic` or `speech`
    pub channel: &'static str,
    /// What the collaborator reported
    pub reason: String,
}

impl DispatchError {
    /// Failure of the haptic motor link
    pub fn haptic(reason: impl Into<String>) -> Self {
        DispatchError {
            channel: "haptic",
            reason: reason.into(),
        }
    }

    /// Failure of the speech engine
    pub fn speech(reason: impl Into<String>) -> Self {
        DispatchError {
            channel: "speech",
            reason: reason.into(),
        }
    }
}

/// Top-level Vision Belt error
#[derive(Error, Debug)]
pub enum BeltError {
    /// Configuration rejected at startup
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// The frame source could not open the capture stream
    #[error("failed to start capture stream: {0}")]
    StreamStart(FrameError),

    /// The capture stream broke while running
    #[error("acquisition failed at tick {tick}: {reason}")]
    AcquisitionFatal { tick: u64, reason: String },

    /// The loop was asked to run from a state that does not allow it
    #[error("acquisition loop cannot run from state {0:?}")]
    InvalidState(LoopState),
}

/// Result alias for fallible loop and startup calls
pub type Result<T> = std::result::Result<T, BeltError>;
