// src/main.rs
// Entry point for the Vision Belt prototype. Loads the settings file, wires the
// acquisition loop to the synthetic camera and the logging haptic/speech stand-ins,
// and runs until Ctrl-C or the optional tick limit.

use clap::Parser;
use log::{error, info};
use std::process::ExitCode;

use vision_belt::{
    AcquisitionLoop, BeltConfig, LogHaptic, LogObserver, LogSpeech, StopFlag,
    SyntheticFrameSource, SyntheticScene,
};

/// Vision Belt obstacle detection prototype
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to YAML settings file
    #[arg(short, long, default_value = "config/settings.yaml")]
    config: String,

    /// Stop after this many ticks (runs until Ctrl-C when omitted)
    #[arg(long)]
    max_ticks: Option<u64>,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .format_timestamp_millis()
        .init();

    let config = match BeltConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config {}: {}", args.config, e);
            return ExitCode::FAILURE;
        }
    };
    info!(
        "Loaded {}: {}x{} @ {} fps, scale {} m/unit, feedback below {} m",
        args.config,
        config.frame_width,
        config.frame_height,
        config.frame_rate,
        config.depth_scale.meters_per_unit(),
        config.feedback_threshold.meters()
    );

    let stop = StopFlag::new();
    let handler_flag = stop.clone();
    if let Err(e) = ctrlc::set_handler(move || {
        info!("Received shutdown signal");
        handler_flag.request_stop();
    }) {
        error!("Failed to install Ctrl-C handler: {}", e);
        return ExitCode::FAILURE;
    }

    let source = SyntheticFrameSource::new(SyntheticScene::default());
    let mut belt = AcquisitionLoop::new(
        config,
        Box::new(source),
        Box::new(LogHaptic::new()),
        Box::new(LogSpeech::new()),
    )
    .with_observer(Box::new(LogObserver));
    if let Some(limit) = args.max_ticks {
        belt = belt.with_tick_limit(limit);
    }

    info!("Vision Belt pipeline started.");
    match belt.run(&stop) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Vision Belt pipeline failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
