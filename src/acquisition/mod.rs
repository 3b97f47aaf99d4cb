//! Acquisition loop for Vision Belt
//!
//! Drives one depth camera session: start the stream, then once per tick check the
//! stop signal, pull an aligned frame pair, run the detector and hand any feedback
//! command to the haptic and speech collaborators. Dropped frames, incomplete pairs
//! and frames without a single valid reading skip the tick; only a broken stream
//! ends the loop early. The camera session is released exactly once on every exit
//! path, including unwinding.

/// Hardware-free frame source
pub mod synthetic;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

pub use synthetic::{SyntheticFrameSource, SyntheticScene};

use crate::config::{BeltConfig, StreamSettings};
use crate::core::{
    Analysis, Detector, FramePair, LoopEvent, LoopLifecycle, LoopState, NoValidSamples,
    StopReason,
};
use crate::dispatch::{self, HapticDispatch, SpeechDispatch};
use crate::error::{BeltError, FrameError, Result};
use crate::observer::{LogObserver, TickObserver};

/// Producer of aligned depth/color frame pairs (the camera SDK in production)
pub trait FrameSource {
    /// Opens the capture stream
    fn start(&mut self, settings: &StreamSettings) -> std::result::Result<(), FrameError>;

    /// Blocks until the next aligned pair is ready
    fn next_frame(&mut self) -> std::result::Result<FramePair, FrameError>;

    /// Closes the capture stream and frees the device
    fn stop(&mut self);
}

/// An open capture stream. Stops the source when closed or dropped, whichever comes first.
pub struct Session<'a> {
    source: &'a mut dyn FrameSource,
    open: bool,
}

impl<'a> Session<'a> {
    /// Starts `source` with `settings`. Nothing needs releasing if this fails.
    pub fn open(
        source: &'a mut dyn FrameSource,
        settings: &StreamSettings,
    ) -> std::result::Result<Self, FrameError> {
        source.start(settings)?;
        Ok(Session { source, open: true })
    }

    /// Next aligned frame pair from the open stream
    pub fn next_frame(&mut self) -> std::result::Result<FramePair, FrameError> {
        self.source.next_frame()
    }

    /// Stops the source now instead of at drop
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.open {
            self.open = false;
            self.source.stop();
        }
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        self.release();
    }
}

/// Cooperative cancellation, polled once at the start of every tick
pub trait StopSignal {
    /// True once the loop should wind down
    fn should_stop(&self) -> bool;
}

impl<F> StopSignal for F
where
    F: Fn() -> bool,
{
    fn should_stop(&self) -> bool {
        self()
    }
}

/// Shareable stop flag, e.g. set from a Ctrl-C handler
#[derive(Clone, Debug, Default)]
pub struct StopFlag(Arc<AtomicBool>);

impl StopFlag {
    /// Flag that has not been raised
    pub fn new() -> Self {
        StopFlag::default()
    }

    /// Asks the loop to stop before its next tick
    pub fn request_stop(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

impl StopSignal for StopFlag {
    fn should_stop(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// What happened during one tick
#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// An obstacle inside the threshold; the command was dispatched
    Feedback(Analysis),
    /// Nearest obstacle is at or beyond the threshold
    Clear(Analysis),
    /// Every depth reading was zero
    NoValidSamples,
    /// No usable frame pair this tick
    FrameUnavailable(String),
}

impl TickOutcome {
    /// Analyses one frame pair without dispatching anything
    pub fn evaluate(detector: &Detector, frame: &FramePair, settings: &StreamSettings) -> Self {
        if !frame.is_complete() {
            return TickOutcome::FrameUnavailable("incomplete frame pair".to_string());
        }

        let (width, height) = (frame.depth.width(), frame.depth.height());
        if width != settings.depth.width as usize || height != settings.depth.height as usize {
            return TickOutcome::FrameUnavailable(format!(
                "frame is {}x{}, stream is {}x{}",
                width, height, settings.depth.width, settings.depth.height
            ));
        }

        match detector.analyze(&frame.depth) {
            Ok(analysis) if analysis.command.is_some() => TickOutcome::Feedback(analysis),
            Ok(analysis) => TickOutcome::Clear(analysis),
            Err(NoValidSamples) => TickOutcome::NoValidSamples,
        }
    }
}

/// Counters for one run of the loop
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoopReport {
    /// Ticks processed, skipped ones included
    pub ticks: u64,
    /// Ticks that dispatched a command
    pub feedback: u64,
    /// Ticks whose nearest obstacle was beyond the threshold
    pub clear: u64,
    /// Ticks whose depth grid was all zeros
    pub no_valid_samples: u64,
    /// Ticks without a usable frame pair
    pub unavailable: u64,
    /// Individual haptic or speech failures
    pub dispatch_failures: u64,
}

impl LoopReport {
    fn record(&mut self, outcome: &TickOutcome) {
        self.ticks += 1;
        match outcome {
            TickOutcome::Feedback(_) => self.feedback += 1,
            TickOutcome::Clear(_) => self.clear += 1,
            TickOutcome::NoValidSamples => self.no_valid_samples += 1,
            TickOutcome::FrameUnavailable(_) => self.unavailable += 1,
        }
    }
}

/// Single-threaded acquisition loop owning one camera session
pub struct AcquisitionLoop {
    config: BeltConfig,
    detector: Detector,
    source: Box<dyn FrameSource>,
    haptic: Box<dyn HapticDispatch>,
    speech: Box<dyn SpeechDispatch>,
    observer: Box<dyn TickObserver>,
    lifecycle: LoopLifecycle,
    tick_limit: Option<u64>,
}

impl AcquisitionLoop {
    /// Loop in `Idle`, reporting to a `LogObserver`
    pub fn new(
        config: BeltConfig,
        source: Box<dyn FrameSource>,
        haptic: Box<dyn HapticDispatch>,
        speech: Box<dyn SpeechDispatch>,
    ) -> Self {
        AcquisitionLoop {
            detector: Detector::from_config(&config),
            config,
            source,
            haptic,
            speech,
            observer: Box::new(LogObserver),
            lifecycle: LoopLifecycle::new(),
            tick_limit: None,
        }
    }

    /// Replaces the default `LogObserver`
    pub fn with_observer(mut self, observer: Box<dyn TickObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Stops after `ticks` ticks, checked at the same point as the stop signal
    pub fn with_tick_limit(mut self, ticks: u64) -> Self {
        self.tick_limit = Some(ticks);
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> LoopState {
        self.lifecycle.state()
    }

    /// Why the loop stopped, once it has
    pub fn stop_reason(&self) -> Option<&StopReason> {
        self.lifecycle.stop_reason()
    }

    /// Runs until `stop` fires, the tick limit is reached or the stream breaks.
    /// A loop runs at most once; afterwards it stays `Stopped`.
    pub fn run(&mut self, stop: &dyn StopSignal) -> Result<LoopReport> {
        let state = self.lifecycle.state();
        if state != LoopState::Idle {
            return Err(BeltError::InvalidState(state));
        }

        let AcquisitionLoop {
            config,
            detector,
            source,
            haptic,
            speech,
            observer,
            lifecycle,
            tick_limit,
        } = self;
        let settings = config.stream_settings();

        let mut session = match Session::open(&mut **source, &settings) {
            Ok(session) => session,
            Err(err) => {
                transition(
                    lifecycle,
                    &mut **observer,
                    LoopEvent::Stop(StopReason::StartFailed(err.to_string())),
                );
                return Err(BeltError::StreamStart(err));
            }
        };
        transition(lifecycle, &mut **observer, LoopEvent::StreamStarted);

        let mut report = LoopReport::default();
        let mut fatal = None;

        let reason = loop {
            if stop.should_stop() {
                break StopReason::Requested;
            }
            if tick_limit.is_some_and(|limit| report.ticks >= limit) {
                break StopReason::TickLimit;
            }
            let tick = report.ticks + 1;

            let outcome = match session.next_frame() {
                Ok(frame) => TickOutcome::evaluate(detector, &frame, &settings),
                Err(FrameError::Unavailable(why)) => TickOutcome::FrameUnavailable(why),
                Err(FrameError::Fatal(why)) => {
                    fatal = Some((tick, why.clone()));
                    break StopReason::AcquisitionFailed(why);
                }
            };

            if let TickOutcome::Feedback(Analysis {
                command: Some(command),
                ..
            }) = &outcome
            {
                let result = dispatch::dispatch(command, &mut **haptic, &mut **speech);
                for failure in result.failures() {
                    report.dispatch_failures += 1;
                    observer.on_dispatch_failure(tick, failure);
                }
            }

            report.record(&outcome);
            observer.on_tick(tick, &outcome);
        };

        session.close();
        transition(lifecycle, &mut **observer, LoopEvent::Stop(reason));
        observer.on_finish(&report);

        match fatal {
            Some((tick, reason)) => Err(BeltError::AcquisitionFatal { tick, reason }),
            None => Ok(report),
        }
    }
}

fn transition(lifecycle: &mut LoopLifecycle, observer: &mut dyn TickObserver, event: LoopEvent) {
    if let Some((from, to)) = lifecycle.apply(event) {
        observer.on_transition(from, to);
    }
}
