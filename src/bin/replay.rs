use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde_json::json;
use speed_detector_rs::replay::{load_log, replay};
use speed_detector_rs::{EstimatorConfig, SpeedEstimator, SpeedUnit};

#[derive(Parser, Debug)]
struct Args {
    /// Path to a recorded samples .json[.gz] log
    #[arg(long, conflicts_with = "dir")]
    log: Option<PathBuf>,

    /// Directory of logs to batch replay (every *.json / *.json.gz)
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Display unit for the final reading (ms, kmh, knots)
    #[arg(long, default_value = "ms")]
    unit: SpeedUnit,

    /// JSON file overriding estimator parameters
    #[arg(long)]
    config: Option<PathBuf>,
}

fn is_log_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    name.ends_with(".json") || name.ends_with(".json.gz")
}

fn run_once(path: &Path, config: &EstimatorConfig, unit: SpeedUnit) -> anyhow::Result<serde_json::Value> {
    let recording = load_log(path)?;
    let mut estimator = SpeedEstimator::with_config(config.clone())?.with_unit(unit);
    let summary = replay(&mut estimator, &recording.samples);
    log::info!(
        "{}: {} samples, peak {:.2} m/s",
        path.display(),
        summary.total_samples,
        summary.peak_speed_mps
    );
    Ok(json!({
        "log": path.display().to_string(),
        "summary": summary,
        "display": summary.final_display.formatted(),
    }))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EstimatorConfig::load(path)?,
        None => EstimatorConfig::default(),
    };

    let paths: Vec<PathBuf> = if let Some(log) = &args.log {
        vec![log.clone()]
    } else if let Some(dir) = &args.dir {
        let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| is_log_file(p))
            .collect();
        entries.sort();
        entries
    } else {
        anyhow::bail!("Provide --log or --dir");
    };

    if paths.is_empty() {
        anyhow::bail!("No logs found");
    }

    let mut results = Vec::with_capacity(paths.len());
    for path in &paths {
        match run_once(path, &config, args.unit) {
            Ok(result) => results.push(result),
            Err(e) => {
                eprintln!("[replay] {} failed: {:#}", path.display(), e);
                results.push(json!({ "log": path.display().to_string(), "error": e.to_string() }));
            }
        }
    }

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
