// core/feedback.rs

// Feedback policy: decides whether an obstacle is close enough to warn about and,
// if so, how strongly to buzz and what to say. Pure computation; sending the
// command to the motors and the speech engine is the acquisition loop's job.

use serde::{Deserialize, Serialize};

use super::direction::Direction;
use crate::config::positive_real;
use crate::error::ConfigError;

/// Distance in meters below which feedback is issued. Always finite and strictly positive.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedbackThreshold(f64);

impl FeedbackThreshold {
    /// Rejects zero, negative and non-finite distances
    pub fn new(meters: f64) -> Result<Self, ConfigError> {
        positive_real("feedback.distance_threshold", meters).map(FeedbackThreshold)
    }

    /// Threshold distance in meters
    pub fn meters(&self) -> f64 {
        self.0
    }
}

/// Haptic direction and strength plus the sentence to speak
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedbackCommand {
    /// Side the wearer should feel the buzz on
    pub direction: Direction,
    /// 0.0 (at threshold) to 1.0 (touching)
    pub intensity: f64,
    /// Sentence for the speech engine
    pub message: String,
}

/// Turns a distance and a side into an optional feedback command
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FeedbackPolicy {
    threshold: FeedbackThreshold,
}

impl FeedbackPolicy {
    /// Policy warning about anything closer than `threshold`
    pub fn new(threshold: FeedbackThreshold) -> Self {
        FeedbackPolicy { threshold }
    }

    /// Distance below which commands are issued
    pub fn threshold(&self) -> FeedbackThreshold {
        self.threshold
    }

    /// Returns `None` when the obstacle is at or beyond the threshold; the near
    /// side is exclusive.
    pub fn decide(&self, distance_meters: f64, direction: Direction) -> Option<FeedbackCommand> {
        let threshold = self.threshold.meters();
        if !(distance_meters < threshold) {
            return None;
        }

        let intensity = ((threshold - distance_meters) / threshold).clamp(0.0, 1.0);
        Some(FeedbackCommand {
            direction,
            intensity,
            message: format!(
                "Obstacle {}, {:.2} meters away",
                direction, distance_meters
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn policy(threshold: f64) -> FeedbackPolicy {
        FeedbackPolicy::new(FeedbackThreshold::new(threshold).unwrap())
    }

    #[test]
    fn halfway_obstacle_gets_half_intensity() {
        let command = policy(1.0).decide(0.5, Direction::Center).unwrap();
        assert_eq!(command.direction, Direction::Center);
        assert_relative_eq!(command.intensity, 0.5);
        assert_eq!(command.message, "Obstacle Center, 0.50 meters away");
    }

    #[test]
    fn obstacle_at_threshold_is_ignored() {
        assert_eq!(policy(1.0).decide(1.0, Direction::Left), None);
    }

    #[test]
    fn obstacle_beyond_threshold_is_ignored() {
        assert_eq!(policy(1.0).decide(3.2, Direction::Right), None);
    }

    #[test]
    fn touching_obstacle_gets_full_intensity() {
        let command = policy(2.0).decide(0.0, Direction::Left).unwrap();
        assert_relative_eq!(command.intensity, 1.0);
        assert_eq!(command.message, "Obstacle Left, 0.00 meters away");
    }

    #[test]
    fn message_rounds_to_centimeters() {
        let command = policy(1.5).decide(1.236, Direction::Right).unwrap();
        assert_eq!(command.message, "Obstacle Right, 1.24 meters away");
        assert!(command.intensity > 0.0 && command.intensity <= 1.0);
    }

    #[test]
    fn nan_distance_produces_no_command() {
        assert_eq!(policy(1.0).decide(f64::NAN, Direction::Center), None);
    }
}
