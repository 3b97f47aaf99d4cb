//! Feedback dispatch for Vision Belt
//!
//! The belt talks to two external collaborators:
//! - haptic motors, driven with a direction and a strength in `[0, 1]`
//! - a speech engine, driven with a short sentence
//!
//! Both are fire-and-forget from the loop's point of view. A failing collaborator
//! reports a `DispatchError`, which the loop logs and otherwise ignores.

mod haptic;
mod speech;

pub use haptic::*;
pub use speech::*;

use crate::core::FeedbackCommand;
use crate::error::DispatchError;

/// Outcome of sending one command to both collaborators
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DispatchResult {
    /// Haptic failure, if any
    pub haptic: Option<DispatchError>,
    /// Speech failure, if any
    pub speech: Option<DispatchError>,
}

impl DispatchResult {
    /// Failures in the order they happened
    pub fn failures(&self) -> impl Iterator<Item = &DispatchError> {
        self.haptic.iter().chain(self.speech.iter())
    }

    /// True when both collaborators accepted the command
    pub fn is_ok(&self) -> bool {
        self.haptic.is_none() && self.speech.is_none()
    }
}

/// Sends `command` to the haptic motors and then the speech engine. The speech call
/// is made even when the haptic call fails.
pub fn dispatch(
    command: &FeedbackCommand,
    haptic: &mut dyn HapticDispatch,
    speech: &mut dyn SpeechDispatch,
) -> DispatchResult {
    DispatchResult {
        haptic: haptic.notify(command.direction, command.intensity).err(),
        speech: speech.notify(&command.message).err(),
    }
}
