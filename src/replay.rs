use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::display::DisplayReading;
use crate::estimator::SpeedEstimator;
use crate::sample::Sample;

/// Recorded session: `{"samples": [{"ax": .., "ay": .., "az": .., "timestamp_nanos": ..}, ..]}`
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct SampleLog {
    pub samples: Vec<Sample>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    pub total_samples: usize,
    pub accepted_samples: usize,
    pub rejected_samples: usize,
    pub duration_secs: f64,
    pub peak_speed_mps: f64,
    pub final_speed_mps: f64,
    pub final_display: DisplayReading,
}

fn is_gzip(path: &Path) -> bool {
    path.extension().map(|e| e == "gz").unwrap_or(false)
}

pub fn load_log(path: &Path) -> Result<SampleLog> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let log: SampleLog = if is_gzip(path) {
        serde_json::from_reader(BufReader::new(GzDecoder::new(file)))?
    } else {
        serde_json::from_reader(BufReader::new(file))?
    };
    Ok(log)
}

pub fn save_log(path: &Path, log: &SampleLog) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    if is_gzip(path) {
        let mut encoder = GzEncoder::new(BufWriter::new(file), Compression::default());
        serde_json::to_writer(&mut encoder, log)?;
        encoder.finish()?.flush()?;
    } else {
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, log)?;
        writer.flush()?;
    }
    Ok(())
}

/// Feed every sample through `estimator`; rejected samples are counted, not fatal.
pub fn replay(estimator: &mut SpeedEstimator, samples: &[Sample]) -> ReplaySummary {
    let mut accepted = 0;
    let mut rejected = 0;
    let mut peak_speed: f64 = 0.0;

    for sample in samples {
        match estimator.on_sample(sample) {
            Ok(_) => {
                accepted += 1;
                peak_speed = peak_speed.max(estimator.speed());
            }
            Err(e) => {
                log::debug!("replay: {}", e);
                rejected += 1;
            }
        }
    }

    let duration_secs = match (samples.first(), samples.last()) {
        (Some(first), Some(last)) => last.seconds_since(first.timestamp_nanos),
        _ => 0.0,
    };

    ReplaySummary {
        total_samples: samples.len(),
        accepted_samples: accepted,
        rejected_samples: rejected,
        duration_secs,
        peak_speed_mps: peak_speed,
        final_speed_mps: estimator.speed(),
        final_display: estimator.reading(),
    }
}
