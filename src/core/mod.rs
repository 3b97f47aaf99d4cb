// core/mod.rs

// Single-frame decision engine. Chains the four stages (valid samples, nearest
// obstacle, lateral band, feedback policy) into one stateless call so a depth grid
// and a configuration always produce the same decision.

/// Depth grids, frame pairs and valid-sample extraction
pub mod depth;
/// Left / center / right bands
pub mod direction;
/// Feedback threshold and policy
pub mod feedback;
/// Nearest-obstacle locator
pub mod perception;
/// Idle / Running / Stopped lifecycle
pub mod state;

pub use depth::{
    extract_valid_samples, ColorGrid, DepthGrid, DepthSample, FramePair, GridShapeError,
    NoValidSamples,
};
pub use direction::Direction;
pub use feedback::{FeedbackCommand, FeedbackPolicy, FeedbackThreshold};
pub use perception::{locate_nearest, nearest_obstacle, DepthScale, ObstacleReading};
pub use state::{LoopEvent, LoopLifecycle, LoopState, StopReason};

use crate::config::BeltConfig;

/// Result of analysing one depth frame
#[derive(Clone, Debug, PartialEq)]
pub struct Analysis {
    /// Nearest valid reading in the frame
    pub reading: ObstacleReading,
    /// Band the nearest reading falls in
    pub direction: Direction,
    /// `None` when the nearest obstacle is not within the feedback threshold
    pub command: Option<FeedbackCommand>,
}

/// Holds only configuration; never carries anything from one frame to the next
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detector {
    scale: DepthScale,
    policy: FeedbackPolicy,
}

impl Detector {
    /// Detector for one camera's depth scale and one feedback threshold
    pub fn new(scale: DepthScale, threshold: FeedbackThreshold) -> Self {
        Detector {
            scale,
            policy: FeedbackPolicy::new(threshold),
        }
    }

    /// Detector built from a validated configuration
    pub fn from_config(config: &BeltConfig) -> Self {
        Self::new(config.depth_scale, config.feedback_threshold)
    }

    /// Depth scale applied to raw readings
    pub fn scale(&self) -> DepthScale {
        self.scale
    }

    /// Policy turning distances into commands
    pub fn policy(&self) -> &FeedbackPolicy {
        &self.policy
    }

    /// Runs all four stages on one depth grid. Fails only when every reading is zero.
    pub fn analyze(&self, grid: &DepthGrid) -> Result<Analysis, NoValidSamples> {
        let reading = nearest_obstacle(grid, self.scale)?;
        let direction = Direction::classify(reading.column, reading.width);
        let command = self.policy.decide(reading.distance_meters, direction);

        Ok(Analysis {
            reading,
            direction,
            command,
        })
    }
}
