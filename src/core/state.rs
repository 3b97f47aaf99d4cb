// core/state.rs

// Lifecycle of the acquisition loop as a three-state machine: Idle until the camera
// stream starts, Running while frames are processed, Stopped once the loop has
// released its session. Stopped is terminal.

// Dependencies
use log::{error, info};

/// Lifecycle state of the acquisition loop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// Created, stream not started
    Idle,
    /// Stream open, processing ticks
    Running,
    /// Session released; cannot restart
    Stopped,
}

/// Why the loop left (or never reached) the Running state
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// External stop signal observed at a tick boundary
    Requested,
    /// Configured tick limit reached
    TickLimit,
    /// The stream could not be opened
    StartFailed(String),
    /// The stream broke mid-run
    AcquisitionFailed(String),
}

/// Events that drive the lifecycle
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoopEvent {
    /// The frame source accepted `start`
    StreamStarted,
    /// The loop is ending for the given reason
    Stop(StopReason),
}

impl LoopState {
    /// Next state for `event`, or `None` if the transition is not allowed
    pub fn on(self, event: &LoopEvent) -> Option<LoopState> {
        match (self, event) {
            (LoopState::Idle, LoopEvent::StreamStarted) => Some(LoopState::Running),
            (LoopState::Idle, LoopEvent::Stop(StopReason::StartFailed(_))) => {
                Some(LoopState::Stopped)
            }
            (LoopState::Running, LoopEvent::Stop(_)) => Some(LoopState::Stopped),
            _ => None,
        }
    }
}

/// Tracks the current lifecycle state and logs each transition
#[derive(Debug)]
pub struct LoopLifecycle {
    current: LoopState,
    stop_reason: Option<StopReason>,
}

impl LoopLifecycle {
    /// Lifecycle starting in `Idle`
    pub fn new() -> Self {
        LoopLifecycle {
            current: LoopState::Idle,
            stop_reason: None,
        }
    }

    /// Current state
    pub fn state(&self) -> LoopState {
        self.current
    }

    /// Set on the transition to `Stopped`
    pub fn stop_reason(&self) -> Option<&StopReason> {
        self.stop_reason.as_ref()
    }

    /// Applies `event`; returns the (from, to) pair, or `None` for an illegal event
    /// which leaves the state unchanged.
    pub fn apply(&mut self, event: LoopEvent) -> Option<(LoopState, LoopState)> {
        let from = self.current;
        let Some(to) = from.on(&event) else {
            error!("Ignored lifecycle event {:?} in state {:?}", event, from);
            return None;
        };

        if let LoopEvent::Stop(reason) = event {
            match &reason {
                StopReason::StartFailed(why) | StopReason::AcquisitionFailed(why) => {
                    error!("Acquisition loop stopping: {}", why)
                }
                other => info!("Acquisition loop stopping: {:?}", other),
            }
            self.stop_reason = Some(reason);
        }

        self.current = to;
        Some((from, to))
    }
}

impl Default for LoopLifecycle {
    fn default() -> Self {
        Self::new()
    }
}
