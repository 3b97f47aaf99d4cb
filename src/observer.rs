// src/observer.rs
// Observability hooks for the acquisition loop. The loop never logs per-tick events
// itself; it reports them to the observer it was built with, so tests can record
// them and the binary can forward them to `log`.

use log::{debug, info, warn};

use crate::acquisition::{LoopReport, TickOutcome};
use crate::core::LoopState;
use crate::error::DispatchError;

/// Receives loop events. Every method defaults to doing nothing.
pub trait TickObserver {
    /// Called for every lifecycle transition
    fn on_transition(&mut self, _from: LoopState, _to: LoopState) {}

    /// Called once per processed tick, after any dispatch
    fn on_tick(&mut self, _tick: u64, _outcome: &TickOutcome) {}

    /// Called for each collaborator failure; the loop carries on afterwards
    fn on_dispatch_failure(&mut self, _tick: u64, _error: &DispatchError) {}

    /// Called once after the session has been released
    fn on_finish(&mut self, _report: &LoopReport) {}
}

/// Forwards loop events to the `log` facade
#[derive(Debug, Default)]
pub struct LogObserver;

impl TickObserver for LogObserver {
    fn on_transition(&mut self, from: LoopState, to: LoopState) {
        info!("Vision Belt pipeline {:?} -> {:?}", from, to);
    }

    fn on_tick(&mut self, tick: u64, outcome: &TickOutcome) {
        match outcome {
            TickOutcome::Feedback(analysis) => {
                if let Some(command) = &analysis.command {
                    info!(
                        "Tick {}: {} (intensity {:.2}, pixel r{} c{})",
                        tick,
                        command.message,
                        command.intensity,
                        analysis.reading.row,
                        analysis.reading.column
                    );
                }
            }
            TickOutcome::Clear(analysis) => debug!(
                "Tick {}: nearest obstacle {:.2} m {}, no feedback",
                tick, analysis.reading.distance_meters, analysis.direction
            ),
            TickOutcome::NoValidSamples => debug!("Tick {}: no valid depth samples", tick),
            TickOutcome::FrameUnavailable(why) => debug!("Tick {}: skipped, {}", tick, why),
        }
    }

    fn on_dispatch_failure(&mut self, tick: u64, error: &DispatchError) {
        warn!("Tick {}: {}", tick, error);
    }

    fn on_finish(&mut self, report: &LoopReport) {
        info!(
            "Vision Belt pipeline stopped after {} ticks ({} feedback, {} clear, {} without samples, {} unavailable, {} dispatch failures)",
            report.ticks,
            report.feedback,
            report.clear,
            report.no_valid_samples,
            report.unavailable,
            report.dispatch_failures
        );
    }
}
