// tests/loop_tests.rs
// Acquisition loop behaviour against mocked camera, motors and speech engine.

use mockall::mock;
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use vision_belt::{
    AcquisitionLoop, BeltConfig, BeltError, ConfigError, DepthGrid, Direction, DispatchError,
    FrameError, FramePair, FrameSource, HapticDispatch, LoopReport, LoopState, SpeechDispatch,
    StopReason, StreamSettings, TickObserver, TickOutcome,
};

mock! {
    pub Source {}
    impl FrameSource for Source {
        fn start(&mut self, settings: &StreamSettings) -> Result<(), FrameError>;
        fn next_frame(&mut self) -> Result<FramePair, FrameError>;
        fn stop(&mut self);
    }
}

mock! {
    pub Haptic {}
    impl HapticDispatch for Haptic {
        fn notify(&mut self, direction: Direction, intensity: f64) -> Result<(), DispatchError>;
    }
}

mock! {
    pub Speech {}
    impl SpeechDispatch for Speech {
        fn notify(&mut self, message: &str) -> Result<(), DispatchError>;
    }
}

#[derive(Default)]
struct Recorded {
    transitions: Vec<(LoopState, LoopState)>,
    outcomes: Vec<TickOutcome>,
    dispatch_failures: Vec<DispatchError>,
    finished: Option<LoopReport>,
}

struct RecordingObserver(Rc<RefCell<Recorded>>);

impl TickObserver for RecordingObserver {
    fn on_transition(&mut self, from: LoopState, to: LoopState) {
        self.0.borrow_mut().transitions.push((from, to));
    }

    fn on_tick(&mut self, _tick: u64, outcome: &TickOutcome) {
        self.0.borrow_mut().outcomes.push(outcome.clone());
    }

    fn on_dispatch_failure(&mut self, _tick: u64, error: &DispatchError) {
        self.0.borrow_mut().dispatch_failures.push(error.clone());
    }

    fn on_finish(&mut self, report: &LoopReport) {
        self.0.borrow_mut().finished = Some(report.clone());
    }
}

// 3x1 stream: threshold 1 m, scale 1 mm per unit.
fn config() -> BeltConfig {
    BeltConfig::new(0.001, 1.0, 3, 1, 30).unwrap()
}

fn frame(values: [u16; 3]) -> FramePair {
    FramePair::with_blank_color(DepthGrid::from_row_slice(3, 1, &values).unwrap())
}

fn started_source() -> MockSource {
    let mut source = MockSource::new();
    source.expect_start().times(1).returning(|_| Ok(()));
    source
}

fn counted_stop(source: &mut MockSource) -> Arc<AtomicUsize> {
    let stops = Arc::new(AtomicUsize::new(0));
    let counter = stops.clone();
    source.expect_stop().times(1).returning(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    stops
}

fn belt(
    source: MockSource,
    haptic: MockHaptic,
    speech: MockSpeech,
) -> (AcquisitionLoop, Rc<RefCell<Recorded>>) {
    let recorded = Rc::new(RefCell::new(Recorded::default()));
    let belt = AcquisitionLoop::new(config(), Box::new(source), Box::new(haptic), Box::new(speech))
        .with_observer(Box::new(RecordingObserver(recorded.clone())));
    (belt, recorded)
}

#[test]
fn close_obstacle_is_dispatched_to_both_collaborators() {
    let mut source = started_source();
    source.expect_next_frame().returning(|| Ok(frame([2000, 500, 3000])));
    counted_stop(&mut source);

    let mut haptic = MockHaptic::new();
    haptic
        .expect_notify()
        .withf(|direction, intensity| *direction == Direction::Center && (*intensity - 0.5).abs() < 1e-9)
        .times(2)
        .returning(|_, _| Ok(()));
    let mut speech = MockSpeech::new();
    speech
        .expect_notify()
        .withf(|message| message.to_string() == "Obstacle Center, 0.50 meters away")
        .times(2)
        .returning(|_| Ok(()));

    let (belt, recorded) = belt(source, haptic, speech);
    let mut belt = belt.with_tick_limit(2);
    let report = belt.run(&|| false).unwrap();

    assert_eq!(report.ticks, 2);
    assert_eq!(report.feedback, 2);
    assert_eq!(
        recorded.borrow().transitions,
        vec![
            (LoopState::Idle, LoopState::Running),
            (LoopState::Running, LoopState::Stopped)
        ]
    );
    assert_eq!(recorded.borrow().finished, Some(report));
}

#[test]
fn all_zero_frames_dispatch_nothing() {
    let mut source = started_source();
    source.expect_next_frame().times(3).returning(|| Ok(frame([0, 0, 0])));
    counted_stop(&mut source);

    let mut haptic = MockHaptic::new();
    haptic.expect_notify().never();
    let mut speech = MockSpeech::new();
    speech.expect_notify().never();

    let (belt, recorded) = belt(source, haptic, speech);
    let mut belt = belt.with_tick_limit(3);
    let report = belt.run(&|| false).unwrap();

    assert_eq!(report.no_valid_samples, 3);
    assert!(recorded
        .borrow()
        .outcomes
        .iter()
        .all(|outcome| *outcome == TickOutcome::NoValidSamples));
}

#[test]
fn unavailable_and_incomplete_frames_are_skipped() {
    let mut source = started_source();
    let calls = Arc::new(AtomicUsize::new(0));
    source.expect_next_frame().returning(move || {
        match calls.fetch_add(1, Ordering::SeqCst) {
            0 => Err(FrameError::Unavailable("timeout".to_string())),
            1 => Ok(FramePair {
                depth: DepthGrid::from_row_slice(3, 1, &[100, 100, 100]).unwrap(),
                color: None,
            }),
            _ => Ok(frame([100, 4000, 4000])),
        }
    });
    counted_stop(&mut source);

    let mut haptic = MockHaptic::new();
    haptic
        .expect_notify()
        .withf(|direction, _| *direction == Direction::Left)
        .times(1)
        .returning(|_, _| Ok(()));
    let mut speech = MockSpeech::new();
    speech.expect_notify().times(1).returning(|_| Ok(()));

    let (belt, _recorded) = belt(source, haptic, speech);
    let mut belt = belt.with_tick_limit(3);
    let report = belt.run(&|| false).unwrap();

    assert_eq!(report.ticks, 3);
    assert_eq!(report.unavailable, 2);
    assert_eq!(report.feedback, 1);
}

#[test]
fn frames_of_another_size_are_skipped_not_analysed() {
    // Stream is 3x1; the source hands back a 9x1 aligned pair with a 0.30 m obstacle.
    let mut source = started_source();
    source.expect_next_frame().times(2).returning(|| {
        let mut depth = DepthGrid::zeros(9, 1);
        depth.set(0, 4, 300);
        Ok(FramePair::with_blank_color(depth))
    });
    counted_stop(&mut source);

    let mut haptic = MockHaptic::new();
    haptic.expect_notify().never();
    let mut speech = MockSpeech::new();
    speech.expect_notify().never();

    let (belt, recorded) = belt(source, haptic, speech);
    let mut belt = belt.with_tick_limit(2);
    let report = belt.run(&|| false).unwrap();

    assert_eq!(report.unavailable, 2);
    assert_eq!(report.feedback, 0);
    assert_eq!(
        recorded.borrow().outcomes[0],
        TickOutcome::FrameUnavailable("frame is 9x1, stream is 3x1".to_string())
    );
}

#[test]
fn config_rejecting_mismatched_color_never_reaches_the_loop() {
    let yaml = "
depth: { width: 6, height: 3, fps: 30, scale: 0.001 }
color: { width: 9, height: 3, fps: 30 }
feedback: { distance_threshold: 1.0 }
";
    let err = BeltConfig::from_yaml_str(yaml).unwrap_err();
    assert!(matches!(
        BeltError::from(err),
        BeltError::Configuration(ConfigError::GeometryMismatch { .. })
    ));
}

#[test]
fn fatal_acquisition_releases_session_once_and_stops_dispatching() {
    let mut source = started_source();
    let calls = Arc::new(AtomicUsize::new(0));
    source.expect_next_frame().returning(move || {
        if calls.fetch_add(1, Ordering::SeqCst) < 2 {
            Ok(frame([300, 4000, 4000]))
        } else {
            Err(FrameError::Fatal("usb disconnected".to_string()))
        }
    });
    let stops = counted_stop(&mut source);

    let mut haptic = MockHaptic::new();
    haptic.expect_notify().times(2).returning(|_, _| Ok(()));
    let mut speech = MockSpeech::new();
    speech.expect_notify().times(2).returning(|_| Ok(()));

    let (mut belt, recorded) = belt(source, haptic, speech);
    let result = belt.run(&|| false);

    match result {
        Err(BeltError::AcquisitionFatal { tick, reason }) => {
            assert_eq!(tick, 3);
            assert_eq!(reason, "usb disconnected");
        }
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(stops.load(Ordering::SeqCst), 1);
    assert_eq!(belt.state(), LoopState::Stopped);
    assert_eq!(
        belt.stop_reason(),
        Some(&StopReason::AcquisitionFailed("usb disconnected".to_string()))
    );
    assert_eq!(recorded.borrow().outcomes.len(), 2);
}

#[test]
fn haptic_failure_does_not_block_speech_or_later_ticks() {
    let mut source = started_source();
    source.expect_next_frame().returning(|| Ok(frame([4000, 4000, 200])));
    counted_stop(&mut source);

    let mut haptic = MockHaptic::new();
    haptic
        .expect_notify()
        .times(3)
        .returning(|_, _| Err(DispatchError::haptic("motor link lost")));

    let spoken = Arc::new(Mutex::new(Vec::new()));
    let sink = spoken.clone();
    let mut speech = MockSpeech::new();
    speech.expect_notify().times(3).returning(move |message| {
        sink.lock().unwrap().push(message.to_string());
        Ok(())
    });

    let (belt, recorded) = belt(source, haptic, speech);
    let mut belt = belt.with_tick_limit(3);
    let report = belt.run(&|| false).unwrap();

    assert_eq!(report.feedback, 3);
    assert_eq!(report.dispatch_failures, 3);
    assert_eq!(recorded.borrow().dispatch_failures.len(), 3);
    assert_eq!(
        *spoken.lock().unwrap(),
        vec!["Obstacle Center, 0.20 meters away".to_string(); 3]
    );
}

#[test]
fn same_frame_twice_yields_identical_commands() {
    let mut source = started_source();
    source.expect_next_frame().times(2).returning(|| Ok(frame([0, 0, 750])));
    counted_stop(&mut source);

    let felt = Arc::new(Mutex::new(Vec::new()));
    let felt_sink = felt.clone();
    let mut haptic = MockHaptic::new();
    haptic.expect_notify().times(2).returning(move |direction, intensity| {
        felt_sink.lock().unwrap().push((direction, intensity));
        Ok(())
    });
    let spoken = Arc::new(Mutex::new(Vec::new()));
    let spoken_sink = spoken.clone();
    let mut speech = MockSpeech::new();
    speech.expect_notify().times(2).returning(move |message| {
        spoken_sink.lock().unwrap().push(message.to_string());
        Ok(())
    });

    let (belt, recorded) = belt(source, haptic, speech);
    let mut belt = belt.with_tick_limit(2);
    belt.run(&|| false).unwrap();

    let felt = felt.lock().unwrap();
    let spoken = spoken.lock().unwrap();
    assert_eq!(felt[0], felt[1]);
    assert_eq!(spoken[0], spoken[1]);
    let recorded = recorded.borrow();
    assert_eq!(recorded.outcomes[0], recorded.outcomes[1]);
}

#[test]
fn stop_signal_is_checked_once_per_tick() {
    let mut source = started_source();
    source.expect_next_frame().times(2).returning(|| Ok(frame([5000, 5000, 5000])));
    counted_stop(&mut source);
    let mut haptic = MockHaptic::new();
    haptic.expect_notify().never();
    let mut speech = MockSpeech::new();
    speech.expect_notify().never();

    let checks = Cell::new(0);
    let stop = || {
        checks.set(checks.get() + 1);
        checks.get() > 2
    };

    let (mut belt, _recorded) = belt(source, haptic, speech);
    let report = belt.run(&stop).unwrap();

    assert_eq!(report.ticks, 2);
    assert_eq!(report.clear, 2);
    assert_eq!(checks.get(), 3);
    assert_eq!(belt.stop_reason(), Some(&StopReason::Requested));
}

#[test]
fn failed_start_never_reads_or_releases() {
    let mut source = MockSource::new();
    source
        .expect_start()
        .times(1)
        .returning(|_| Err(FrameError::Fatal("no device".to_string())));
    source.expect_next_frame().never();
    source.expect_stop().never();

    let (mut belt, recorded) = belt(source, MockHaptic::new(), MockSpeech::new());
    let result = belt.run(&|| false);

    assert!(matches!(result, Err(BeltError::StreamStart(FrameError::Fatal(_)))));
    assert_eq!(belt.state(), LoopState::Stopped);
    assert_eq!(
        recorded.borrow().transitions,
        vec![(LoopState::Idle, LoopState::Stopped)]
    );
}

struct PanickingSpeech;

impl SpeechDispatch for PanickingSpeech {
    fn notify(&mut self, _message: &str) -> Result<(), DispatchError> {
        panic!("speech engine crashed");
    }
}

#[test]
fn panic_mid_tick_still_releases_session() {
    let mut source = started_source();
    source.expect_next_frame().returning(|| Ok(frame([100, 100, 100])));
    let stops = counted_stop(&mut source);
    let mut haptic = MockHaptic::new();
    haptic.expect_notify().returning(|_, _| Ok(()));

    let mut belt = AcquisitionLoop::new(
        config(),
        Box::new(source),
        Box::new(haptic),
        Box::new(PanickingSpeech),
    );
    let result = panic::catch_unwind(AssertUnwindSafe(|| belt.run(&|| false)));

    assert!(result.is_err());
    assert_eq!(stops.load(Ordering::SeqCst), 1);
}
