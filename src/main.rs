use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use crossbeam::channel::{bounded, Receiver};
use std::io::BufRead;
use std::path::PathBuf;
use std::thread;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

use speed_detector_rs::replay::{save_log, SampleLog};
use speed_detector_rs::sensors;
use speed_detector_rs::{
    ChannelSink, DisplayReading, EstimatorConfig, Sample, SharedEstimator, SpeedEstimator,
    SpeedUnit,
};

#[derive(Parser, Debug)]
#[command(name = "speed_detector")]
#[command(about = "Accelerometer speed estimator", long_about = None)]
struct Args {
    /// Duration in seconds (0 = until Ctrl-C)
    #[arg(value_name = "SECONDS", default_value = "0")]
    duration: u64,

    /// Display unit (ms, kmh, knots)
    #[arg(long, default_value = "ms")]
    unit: SpeedUnit,

    /// JSON file overriding estimator parameters
    #[arg(long)]
    config: Option<PathBuf>,

    /// Accelerometer polling rate
    #[arg(long, default_value = "50")]
    rate_hz: f64,

    /// Use the synthetic signal instead of termux-sensor
    #[arg(long)]
    mock: bool,

    /// Save accepted raw samples to this file (.json or .json.gz)
    #[arg(long)]
    record: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EstimatorConfig::load(path)?,
        None => EstimatorConfig::default(),
    };

    println!("[{}] Speed Detector starting", ts_now());
    println!("  Duration: {} seconds (0=continuous)", args.duration);
    println!("  Unit: {}", args.unit);
    println!("  Rate: {} Hz", args.rate_hz);
    println!("  Commands: ms | kmh | knots | reset");

    let (display_tx, display_rx) = bounded::<DisplayReading>(64);
    let estimator = SpeedEstimator::with_config(config)?
        .with_unit(args.unit)
        .with_sink(ChannelSink::new(display_tx));
    let shared = SharedEstimator::new(estimator);

    let _display_handle = thread::spawn(move || display_loop(display_rx));
    let control = shared.clone();
    let _control_handle = thread::spawn(move || control_loop(control));

    let (sample_tx, mut sample_rx) = mpsc::channel::<Sample>(500);
    let _accel_handle = tokio::spawn(sensors::accel_loop(sample_tx, args.rate_hz, args.mock));

    let mut recorded = Vec::new();
    let deadline = sleep(if args.duration > 0 {
        Duration::from_secs(args.duration)
    } else {
        Duration::MAX
    });
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            maybe_sample = sample_rx.recv() => {
                let Some(sample) = maybe_sample else { break };
                match shared.on_sample(&sample) {
                    Ok(_) => {
                        if args.record.is_some() {
                            recorded.push(sample);
                        }
                    }
                    Err(e) if e.is_rejected_sample() => log::debug!("{}", e),
                    Err(e) => return Err(e.into()),
                }
            }
            _ = &mut deadline => {
                println!("\n[{}] Duration reached, stopping...", ts_now());
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\n[{}] Interrupted, stopping...", ts_now());
                break;
            }
        }
    }

    if let Some(path) = &args.record {
        let recording = SampleLog { samples: recorded };
        save_log(path, &recording)?;
        println!(
            "[{}] Saved {} samples to {}",
            ts_now(),
            recording.samples.len(),
            path.display()
        );
    }

    let snapshot = shared.snapshot()?;
    println!("\n=== Final State ===");
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    Ok(())
}

/// Prints the reading whenever its rendered text changes
fn display_loop(rx: Receiver<DisplayReading>) {
    let mut last = String::new();
    for reading in rx.iter() {
        let text = reading.formatted();
        if text != last {
            println!("[{}] {}", ts_now(), text);
            last = text;
        }
    }
}

/// Unit switching and resets from stdin, on its own thread
fn control_loop(estimator: SharedEstimator) {
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let Ok(line) = line else { break };
        let command = line.trim();
        if command.is_empty() {
            continue;
        }
        let result = if command.eq_ignore_ascii_case("reset") {
            estimator.reset()
        } else {
            match command.parse::<SpeedUnit>() {
                Ok(unit) => estimator.set_unit(unit).map(|_| ()),
                Err(e) => {
                    eprintln!("{}", e);
                    Ok(())
                }
            }
        };
        if let Err(e) = result {
            log::error!("control command '{}' failed: {}", command, e);
            break;
        }
    }
}

fn ts_now() -> String {
    Utc::now().format("%H:%M:%S").to_string()
}
