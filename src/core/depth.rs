// core/depth.rs

// Depth frame containers and the valid-sample extractor. A depth grid holds raw z16
// readings (one per pixel, rows = image height, columns = image width); a reading of
// zero means the sensor got no return for that pixel and is never treated as an obstacle.

// Dependencies
use nalgebra::DMatrix;
use thiserror::Error;

/// Raised when a depth grid has no non-zero reading at all
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("depth grid contains no valid samples")]
pub struct NoValidSamples;

/// Raised when a flat buffer does not match the requested grid geometry
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("expected {expected} depth values for the grid, got {actual}")]
pub struct GridShapeError {
    /// width * height
    pub expected: usize,
    /// Number of values supplied
    pub actual: usize,
}

/// One valid depth reading and where it was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthSample {
    /// Raw sensor units, never zero
    pub value: u16,
    /// Row of the pixel
    pub row: usize,
    /// Column of the pixel
    pub column: usize,
}

/// Raw depth image in sensor units
#[derive(Debug, Clone, PartialEq)]
pub struct DepthGrid {
    data: DMatrix<u16>,
}

/// BGR color image aligned to the depth grid. Only its presence and geometry matter here.
pub type ColorGrid = DMatrix<[u8; 3]>;

impl DepthGrid {
    /// Wraps an existing matrix (rows = height, columns = width)
    pub fn from_matrix(data: DMatrix<u16>) -> Self {
        DepthGrid { data }
    }

    /// Builds a grid from row-major values, as delivered by most camera SDKs
    pub fn from_row_slice(
        width: usize,
        height: usize,
        values: &[u16],
    ) -> Result<Self, GridShapeError> {
        let expected = width * height;
        if values.len() != expected {
            return Err(GridShapeError {
                expected,
                actual: values.len(),
            });
        }
        Ok(DepthGrid {
            data: DMatrix::from_row_slice(height, width, values),
        })
    }

    /// All-invalid grid of the given size
    pub fn zeros(width: usize, height: usize) -> Self {
        DepthGrid {
            data: DMatrix::zeros(height, width),
        }
    }

    /// Number of columns
    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    /// Number of rows
    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// Raw reading at (row, column), if inside the grid
    pub fn get(&self, row: usize, column: usize) -> Option<u16> {
        self.data.get((row, column)).copied()
    }

    /// Overwrites one reading. Panics when `row`/`column` is outside the grid.
    pub fn set(&mut self, row: usize, column: usize, value: u16) {
        if let Some(cell) = self.data.get_mut((row, column)) {
            *cell = value;
        }
    }

    /// Underlying matrix
    pub fn as_matrix(&self) -> &DMatrix<u16> {
        &self.data
    }

    /// Lazily yields every non-zero reading in row-major order (row 0 first, left to
    /// right). Each pixel is visited exactly once.
    pub fn valid_samples(&self) -> impl Iterator<Item = DepthSample> + '_ {
        let width = self.width();
        (0..self.height())
            .flat_map(move |row| (0..width).map(move |column| (row, column)))
            .filter_map(move |(row, column)| {
                let value = self.data[(row, column)];
                (value != 0).then_some(DepthSample { value, row, column })
            })
    }

    /// Number of pixels holding a valid reading
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|&&value| value != 0).count()
    }
}

/// Collects the valid samples of a grid, failing when every reading is zero
pub fn extract_valid_samples(grid: &DepthGrid) -> Result<Vec<DepthSample>, NoValidSamples> {
    let samples: Vec<DepthSample> = grid.valid_samples().collect();
    if samples.is_empty() {
        return Err(NoValidSamples);
    }
    Ok(samples)
}

/// Depth and color frames for one tick, already aligned to the same pixel grid
#[derive(Debug, Clone, PartialEq)]
pub struct FramePair {
    /// Depth aligned to the color frame
    pub depth: DepthGrid,
    /// `None` when the camera delivered only depth
    pub color: Option<ColorGrid>,
}

impl FramePair {
    /// Complete pair from both halves
    pub fn new(depth: DepthGrid, color: ColorGrid) -> Self {
        FramePair {
            depth,
            color: Some(color),
        }
    }

    /// Pairs a depth grid with a blank color frame of the same size
    pub fn with_blank_color(depth: DepthGrid) -> Self {
        let color = ColorGrid::from_element(depth.height(), depth.width(), [0, 0, 0]);
        FramePair::new(depth, color)
    }

    /// A pair is usable only when both frames arrived and share the same geometry
    pub fn is_complete(&self) -> bool {
        match &self.color {
            Some(color) => {
                color.nrows() == self.depth.height() && color.ncols() == self.depth.width()
            }
            None => false,
        }
    }
}
