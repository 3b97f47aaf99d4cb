// src/config.rs
// Loads the Vision Belt settings file and validates it into `BeltConfig`.
// The YAML layout follows the prototype's settings file (depth / color / feedback
// sections); every engine value is checked once here so the loop never sees a
// missing or non-positive number.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::feedback::FeedbackThreshold;
use crate::core::perception::DepthScale;
use crate::error::ConfigError;

/// Resolution and rate of one camera stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamProfile {
    /// Pixels per row
    pub width: u32,
    /// Rows per frame
    pub height: u32,
    /// Frames per second
    pub fps: u32,
}

/// What the frame source is asked to open when the loop starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamSettings {
    /// Depth stream (z16)
    pub depth: StreamProfile,
    /// Color stream the depth frames are aligned to (bgr8)
    pub color: StreamProfile,
}

/// Validated Vision Belt configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BeltConfig {
    /// Meters per raw depth unit
    pub depth_scale: DepthScale,
    /// Distance below which feedback is issued
    pub feedback_threshold: FeedbackThreshold,
    /// Depth frame width in pixels
    pub frame_width: u32,
    /// Depth frame height in pixels
    pub frame_height: u32,
    /// Frames per second requested from the camera
    pub frame_rate: u32,
    /// Color stream profile; mirrors the depth stream unless configured
    pub color: StreamProfile,
}

// Raw file layout. Every value is optional so a missing key can be reported by name
// instead of as a generic deserialization failure.
#[derive(Deserialize, Serialize, Debug, Default)]
struct RawSettings {
    depth: Option<RawDepth>,
    color: Option<RawStream>,
    feedback: Option<RawFeedback>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
struct RawDepth {
    width: Option<i64>,
    height: Option<i64>,
    fps: Option<i64>,
    scale: Option<f64>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
struct RawStream {
    width: Option<i64>,
    height: Option<i64>,
    fps: Option<i64>,
}

#[derive(Deserialize, Serialize, Debug, Default)]
struct RawFeedback {
    distance_threshold: Option<f64>,
}

impl BeltConfig {
    /// Builds a configuration from already-known values, applying the same checks as
    /// the settings file. The color stream mirrors the depth stream.
    pub fn new(
        depth_scale: f64,
        feedback_threshold: f64,
        frame_width: u32,
        frame_height: u32,
        frame_rate: u32,
    ) -> Result<Self, ConfigError> {
        let frame_width = positive_dimension("depth.width", i64::from(frame_width))?;
        let frame_height = positive_dimension("depth.height", i64::from(frame_height))?;
        let frame_rate = positive_dimension("depth.fps", i64::from(frame_rate))?;

        Ok(BeltConfig {
            depth_scale: DepthScale::new(depth_scale)?,
            feedback_threshold: FeedbackThreshold::new(feedback_threshold)?,
            frame_width,
            frame_height,
            frame_rate,
            color: StreamProfile {
                width: frame_width,
                height: frame_height,
                fps: frame_rate,
            },
        })
    }

    /// Reads and validates a YAML settings file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let config_file = std::fs::File::open(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let raw: RawSettings = serde_yaml::from_reader(config_file)?;
        Self::from_raw(raw)
    }

    /// Parses and validates settings held in memory
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let raw: RawSettings = serde_yaml::from_str(yaml)?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSettings) -> Result<Self, ConfigError> {
        let depth = raw.depth.ok_or(ConfigError::Missing { field: "depth" })?;
        let feedback = raw
            .feedback
            .ok_or(ConfigError::Missing { field: "feedback" })?;

        let frame_width = positive_dimension("depth.width", required("depth.width", depth.width)?)?;
        let frame_height =
            positive_dimension("depth.height", required("depth.height", depth.height)?)?;
        let frame_rate = positive_dimension("depth.fps", required("depth.fps", depth.fps)?)?;
        let depth_scale = DepthScale::new(required("depth.scale", depth.scale)?)?;
        let feedback_threshold = FeedbackThreshold::new(required(
            "feedback.distance_threshold",
            feedback.distance_threshold,
        )?)?;

        // Depth is aligned onto the color stream, so an unspecified color section
        // simply mirrors the depth geometry and a specified one must match it.
        let color = match raw.color {
            None => StreamProfile {
                width: frame_width,
                height: frame_height,
                fps: frame_rate,
            },
            Some(color) => StreamProfile {
                width: positive_dimension(
                    "color.width",
                    color.width.unwrap_or(i64::from(frame_width)),
                )?,
                height: positive_dimension(
                    "color.height",
                    color.height.unwrap_or(i64::from(frame_height)),
                )?,
                fps: positive_dimension("color.fps", color.fps.unwrap_or(i64::from(frame_rate)))?,
            },
        };
        if color.width != frame_width || color.height != frame_height {
            return Err(ConfigError::GeometryMismatch {
                depth_width: frame_width,
                depth_height: frame_height,
                color_width: color.width,
                color_height: color.height,
            });
        }

        Ok(BeltConfig {
            depth_scale,
            feedback_threshold,
            frame_width,
            frame_height,
            frame_rate,
            color,
        })
    }

    /// Stream profiles handed to the frame source on start
    pub fn stream_settings(&self) -> StreamSettings {
        StreamSettings {
            depth: StreamProfile {
                width: self.frame_width,
                height: self.frame_height,
                fps: self.frame_rate,
            },
            color: self.color,
        }
    }
}

fn required<T>(field: &'static str, value: Option<T>) -> Result<T, ConfigError> {
    value.ok_or(ConfigError::Missing { field })
}

fn positive_dimension(field: &'static str, value: i64) -> Result<u32, ConfigError> {
    if value <= 0 {
        return Err(ConfigError::NonPositive {
            field,
            value: value as f64,
        });
    }
    u32::try_from(value).map_err(|_| ConfigError::OutOfRange { field, value })
}

/// Checks a real-valued setting is finite and strictly positive
pub(crate) fn positive_real(field: &'static str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(ConfigError::NonPositive { field, value })
    }
}
