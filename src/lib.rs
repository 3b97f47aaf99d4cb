//! Vision Belt - obstacle feedback for a body-worn depth camera
//!
//! This library provides the perception-and-decision core of the Vision Belt
//! assistive navigation device: it finds the nearest obstacle in each aligned depth
//! frame, works out whether it is to the wearer's left, center or right, and decides
//! what haptic and spoken feedback to give.
//!
//! The camera SDK, the haptic motor link and the speech engine are external
//! collaborators reached through the [`FrameSource`], [`HapticDispatch`] and
//! [`SpeechDispatch`] traits.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]

/// Camera session, stop signal and the acquisition loop
pub mod acquisition;
/// Settings file loading and validation
pub mod config;
/// Single-frame decision engine and loop lifecycle
pub mod core;
/// Haptic and speech collaborators
pub mod dispatch;
/// Error types
pub mod error;
/// Loop event hooks
pub mod observer;

// Re-export commonly used items for easier access
pub use acquisition::{
    AcquisitionLoop, FrameSource, LoopReport, Session, StopFlag, StopSignal,
    SyntheticFrameSource, SyntheticScene, TickOutcome,
};
pub use config::{BeltConfig, StreamProfile, StreamSettings};
pub use crate::core::{
    Analysis, DepthGrid, DepthScale, Detector, Direction, FeedbackCommand, FeedbackPolicy,
    FeedbackThreshold, FramePair, LoopState, NoValidSamples, ObstacleReading, StopReason,
};
pub use dispatch::{HapticDispatch, LogHaptic, LogSpeech, SpeechDispatch};
pub use error::{BeltError, ConfigError, DispatchError, FrameError, Result};
pub use observer::{LogObserver, TickObserver};
