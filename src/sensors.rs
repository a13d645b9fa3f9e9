use std::process::Command;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::Sender;
use tokio::time::{interval, Duration, Instant};

use crate::sample::Sample;

/// Poll the accelerometer at `rate_hz` and push samples into `tx`.
///
/// Timestamps come from a monotonic clock started when the loop starts.
/// Reads `termux-sensor` when it is installed, otherwise produces a mock
/// drive signal. Returns when the receiver is dropped.
pub async fn accel_loop(tx: Sender<Sample>, rate_hz: f64, use_mock: bool) {
    let period = Duration::from_secs_f64(1.0 / rate_hz.max(1.0));
    let mut ticker = interval(period);
    let start = Instant::now();
    let mut sample_count = 0u64;
    let mut use_mock = use_mock;

    loop {
        ticker.tick().await;
        let timestamp_nanos = start.elapsed().as_nanos() as i64;

        let sample = if use_mock {
            mock_accel_sample(timestamp_nanos)
        } else {
            match read_accelerometer(timestamp_nanos) {
                Some(sample) => sample,
                None => {
                    log::warn!("[accel] termux-sensor unavailable, switching to mock data");
                    use_mock = true;
                    mock_accel_sample(timestamp_nanos)
                }
            }
        };

        match tx.try_send(sample) {
            Ok(_) => {
                sample_count += 1;
                if sample_count % 500 == 0 {
                    log::debug!("[accel] {} samples", sample_count);
                }
            }
            Err(TrySendError::Closed(_)) => {
                log::info!("[accel] channel closed after {} samples", sample_count);
                break;
            }
            Err(TrySendError::Full(_)) => {
                // Consumer is behind, drop this sample
            }
        }
    }
}

fn read_accelerometer(timestamp_nanos: i64) -> Option<Sample> {
    let output = Command::new("termux-sensor")
        .arg("-n")
        .arg("1")
        .arg("-s")
        .arg("accelerometer")
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    parse_termux_output(&String::from_utf8_lossy(&output.stdout), timestamp_nanos)
}

/// Parses the `"values": [x, y, z]` array of a termux-sensor JSON event
pub fn parse_termux_output(output: &str, timestamp_nanos: i64) -> Option<Sample> {
    let json: serde_json::Value = serde_json::from_str(output).ok()?;
    let values = json
        .as_object()?
        .values()
        .find_map(|sensor| sensor.get("values"))?
        .as_array()?;
    if values.len() < 3 {
        return None;
    }
    Some(Sample::new(
        values[0].as_f64()?,
        values[1].as_f64()?,
        values[2].as_f64()?,
        timestamp_nanos,
    ))
}

/// Gravity on z plus a slow forward surge on x, and a little jitter
pub fn mock_accel_sample(timestamp_nanos: i64) -> Sample {
    use std::f64::consts::PI;
    static COUNTER: AtomicU64 = AtomicU64::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed) as f64;
    let t = timestamp_nanos as f64 / 1e9;

    Sample::new(
        (t * 0.1 * 2.0 * PI).sin().max(0.0) * 3.0 + (n * 1.7).sin() * 0.05,
        (n * 2.3).cos() * 0.05,
        9.81 + (n * 0.9).sin() * 0.05,
        timestamp_nanos,
    )
}
