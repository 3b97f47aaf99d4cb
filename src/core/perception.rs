// core/perception.rs

// Nearest-obstacle locator. Scans the valid depth samples for the smallest raw
// reading and converts it to meters with the camera's depth scale.

// Dependencies
use serde::{Deserialize, Serialize};

use super::depth::{DepthGrid, DepthSample, NoValidSamples};
use crate::config::positive_real;
use crate::error::ConfigError;

/// Meters per raw depth unit. Always finite and strictly positive.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DepthScale(f64);

impl DepthScale {
    /// Rejects zero, negative and non-finite scales
    pub fn new(meters_per_unit: f64) -> Result<Self, ConfigError> {
        positive_real("depth.scale", meters_per_unit).map(DepthScale)
    }

    /// Meters represented by one raw unit
    pub fn meters_per_unit(&self) -> f64 {
        self.0
    }

    /// Converts a raw sensor reading to meters
    pub fn to_meters(&self, raw: u16) -> f64 {
        f64::from(raw) * self.0
    }
}

/// Closest valid point of one frame
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObstacleReading {
    /// Raw value times the depth scale
    pub distance_meters: f64,
    /// Smallest non-zero reading in the grid
    pub raw_value: u16,
    /// Row of the reading
    pub row: usize,
    /// Column of the reading
    pub column: usize,
    /// Width of the grid the reading came from
    pub width: usize,
}

/// Finds the nearest valid sample. Ties keep the first sample seen, so with
/// `DepthGrid::valid_samples` the winner is the first minimum in row-major order.
pub fn locate_nearest<I>(
    samples: I,
    scale: DepthScale,
    width: usize,
) -> Result<ObstacleReading, NoValidSamples>
where
    I: IntoIterator<Item = DepthSample>,
{
    let nearest = samples
        .into_iter()
        .fold(None::<DepthSample>, |best, sample| match best {
            Some(current) if current.value <= sample.value => Some(current),
            _ => Some(sample),
        })
        .ok_or(NoValidSamples)?;

    Ok(ObstacleReading {
        distance_meters: scale.to_meters(nearest.value),
        raw_value: nearest.value,
        row: nearest.row,
        column: nearest.column,
        width,
    })
}

/// Locates the nearest obstacle directly on a grid, without materialising the samples
pub fn nearest_obstacle(
    grid: &DepthGrid,
    scale: DepthScale,
) -> Result<ObstacleReading, NoValidSamples> {
    locate_nearest(grid.valid_samples(), scale, grid.width())
}
