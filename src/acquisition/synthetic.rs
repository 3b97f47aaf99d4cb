//! Synthetic depth camera
//!
//! Generates aligned frame pairs without hardware: a flat background wall with a
//! rectangular obstacle that sweeps from the left edge to the right edge while
//! approaching the wearer, then starts over. Dropped frames and frames missing their
//! color half are injected on a fixed schedule so the loop's skip paths get exercised.
//! Output is fully deterministic for a given scene.

use log::{info, warn};
use std::thread;
use std::time::{Duration, Instant};

use super::FrameSource;
use crate::config::StreamSettings;
use crate::core::{ColorGrid, DepthGrid, FramePair};
use crate::error::FrameError;

/// Scene parameters, all depths in raw sensor units
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticScene {
    /// Background wall reading
    pub wall_raw: u16,
    /// Obstacle reading at the start of a sweep
    pub far_raw: u16,
    /// Obstacle reading at the end of a sweep
    pub near_raw: u16,
    /// Frames per left-to-right pass
    pub sweep_frames: u32,
    /// Obstacle width as a fraction of the frame width
    pub obstacle_fraction: f64,
    /// Every n-th frame comes back with no valid depth at all
    pub dropout_every: Option<u64>,
    /// Every n-th frame comes back without its color frame
    pub incomplete_every: Option<u64>,
    /// Stream reports a fatal failure once this many frames were delivered
    pub fail_after: Option<u64>,
    /// Sleep between frames to honour the configured frame rate
    pub paced: bool,
}

impl Default for SyntheticScene {
    fn default() -> Self {
        SyntheticScene {
            wall_raw: 4000,
            far_raw: 2500,
            near_raw: 300,
            sweep_frames: 90,
            obstacle_fraction: 0.15,
            dropout_every: Some(25),
            incomplete_every: Some(40),
            fail_after: None,
            paced: true,
        }
    }
}

/// `FrameSource` that renders a `SyntheticScene` at the requested depth geometry
pub struct SyntheticFrameSource {
    scene: SyntheticScene,
    settings: Option<StreamSettings>,
    delivered: u64,
    last_frame: Option<Instant>,
}

impl SyntheticFrameSource {
    /// Source for `scene`; call `start` before reading frames
    pub fn new(scene: SyntheticScene) -> Self {
        SyntheticFrameSource {
            scene,
            settings: None,
            delivered: 0,
            last_frame: None,
        }
    }

    /// Frames handed out since the stream was started
    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    /// True between `start` and `stop`
    pub fn is_streaming(&self) -> bool {
        self.settings.is_some()
    }

    fn pace(&mut self, fps: u32) {
        let period = Duration::from_secs_f64(1.0 / f64::from(fps.max(1)));
        if let Some(last) = self.last_frame {
            let elapsed = last.elapsed();
            if elapsed < period {
                thread::sleep(period - elapsed);
            }
        }
        self.last_frame = Some(Instant::now());
    }

    /// Renders frame `index` (1-based) of the sweep
    fn render(&self, index: u64, width: usize, height: usize) -> DepthGrid {
        let scene = &self.scene;
        let mut grid = DepthGrid::zeros(width, height);
        if width == 0 || height == 0 {
            return grid;
        }

        let sweep = u64::from(scene.sweep_frames.max(1));
        let phase = ((index - 1) % sweep) as f64 / sweep as f64;
        let center = (phase * (width - 1) as f64).round() as usize;
        let half = ((width as f64 * scene.obstacle_fraction) / 2.0).max(1.0) as usize;
        let left = center.saturating_sub(half);
        let right = (center + half).min(width - 1);
        let obstacle_raw =
            f64::from(scene.far_raw) - (f64::from(scene.far_raw) - f64::from(scene.near_raw)) * phase;
        let obstacle_raw = obstacle_raw.round() as u16;

        for row in 0..height {
            for column in 0..width {
                // Sparse speckle of missing returns, as real sensors show on edges.
                let value = if (row * width + column) % 97 == 96 {
                    0
                } else if row >= height / 3 && (left..=right).contains(&column) {
                    obstacle_raw
                } else {
                    scene.wall_raw
                };
                grid.set(row, column, value);
            }
        }
        grid
    }
}

fn on_schedule(every: Option<u64>, index: u64) -> bool {
    matches!(every, Some(n) if n > 0 && index % n == 0)
}

impl FrameSource for SyntheticFrameSource {
    fn start(&mut self, settings: &StreamSettings) -> Result<(), FrameError> {
        if self.settings.is_some() {
            return Err(FrameError::Fatal("synthetic stream already started".to_string()));
        }
        info!(
            "Synthetic camera streaming {}x{} @ {} fps",
            settings.depth.width, settings.depth.height, settings.depth.fps
        );
        self.settings = Some(*settings);
        self.delivered = 0;
        self.last_frame = None;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<FramePair, FrameError> {
        let Some(settings) = self.settings else {
            return Err(FrameError::Fatal("synthetic stream is not running".to_string()));
        };
        if let Some(limit) = self.scene.fail_after {
            if self.delivered >= limit {
                warn!("Synthetic camera dropping the stream after {} frames", limit);
                return Err(FrameError::Fatal(format!(
                    "synthetic stream closed after {} frames",
                    limit
                )));
            }
        }
        if self.scene.paced {
            self.pace(settings.depth.fps);
        }

        self.delivered += 1;
        let index = self.delivered;
        let width = settings.depth.width as usize;
        let height = settings.depth.height as usize;

        let depth = if on_schedule(self.scene.dropout_every, index) {
            DepthGrid::zeros(width, height)
        } else {
            self.render(index, width, height)
        };

        if on_schedule(self.scene.incomplete_every, index) {
            return Ok(FramePair { depth, color: None });
        }
        let color = ColorGrid::from_element(height, width, [64, 64, 64]);
        Ok(FramePair::new(depth, color))
    }

    fn stop(&mut self) {
        if self.settings.take().is_some() {
            info!("Synthetic camera stopped after {} frames", self.delivered);
        }
    }
}
