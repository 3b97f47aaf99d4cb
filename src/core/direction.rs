// core/direction.rs

// Lateral classifier: splits the frame into three vertical bands and reports which
// one the obstacle column falls in. The middle band is closed, so columns exactly on
// width/3 or 2*width/3 count as Center.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Side of the wearer an obstacle is on
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Left third of the frame
    Left,
    /// Middle band, both edges included
    Center,
    /// Right third of the frame
    Right,
}

impl Display for Direction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Left => write!(f, "Left"),
            Direction::Center => write!(f, "Center"),
            Direction::Right => write!(f, "Right"),
        }
    }
}

impl Direction {
    /// Classifies `column` within a frame `width` pixels wide.
    /// Expects `width > 0` and `column < width`.
    pub fn classify(column: usize, width: usize) -> Direction {
        let column = column as f64;
        let width = width as f64;

        if column < width / 3.0 {
            Direction::Left
        } else if column > 2.0 * width / 3.0 {
            Direction::Right
        } else {
            Direction::Center
        }
    }
}
