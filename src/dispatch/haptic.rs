// src/dispatch/haptic.rs
// Haptic motor collaborator. The real belt maps direction and strength to PWM duty
// cycles over a wireless link; that driver lives outside this crate.

use log::info;

use crate::core::Direction;
use crate::error::DispatchError;

/// Vibrates the motor bank facing `direction` with the given strength
pub trait HapticDispatch {
    /// `intensity` is in `[0, 1]`. Must not block waiting for the motors.
    fn notify(&mut self, direction: Direction, intensity: f64) -> Result<(), DispatchError>;
}

/// Stand-in that logs every command instead of driving motors
#[derive(Debug, Default)]
pub struct LogHaptic {
    sent: u64,
}

impl LogHaptic {
    /// Stand-in with no commands sent yet
    pub fn new() -> Self {
        LogHaptic::default()
    }

    /// Number of commands logged so far
    pub fn sent(&self) -> u64 {
        self.sent
    }
}

impl HapticDispatch for LogHaptic {
    fn notify(&mut self, direction: Direction, intensity: f64) -> Result<(), DispatchError> {
        if !(0.0..=1.0).contains(&intensity) {
            return Err(DispatchError::haptic(format!(
                "intensity {} outside [0, 1]",
                intensity
            )));
        }
        self.sent += 1;
        info!("Haptic: {} (strength={:.2})", direction, intensity);
        Ok(())
    }
}
