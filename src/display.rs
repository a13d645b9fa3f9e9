use crossbeam::channel::{Sender, TrySendError};
use serde::Serialize;

use crate::units::SpeedUnit;

/// Display-ready speed: converted value plus unit suffix
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DisplayReading {
    pub value: f64,
    pub suffix: &'static str,
}

impl DisplayReading {
    pub fn new(speed_mps: f64, unit: SpeedUnit) -> Self {
        let (value, suffix) = unit.convert(speed_mps);
        Self { value, suffix }
    }

    /// One decimal place, e.g. "17.6 km/h"
    pub fn formatted(&self) -> String {
        format!("{:.1} {}", self.value, self.suffix)
    }
}

/// Outbound side of the estimator. Called with the estimator lock held, so
/// implementations must return promptly.
pub trait DisplaySink: Send {
    fn show(&mut self, reading: &DisplayReading);
}

impl<F> DisplaySink for F
where
    F: FnMut(&DisplayReading) + Send,
{
    fn show(&mut self, reading: &DisplayReading) {
        self(reading)
    }
}

/// Forwards readings to another thread without blocking. A full channel
/// drops the reading; the next sample supersedes it anyway.
pub struct ChannelSink {
    tx: Sender<DisplayReading>,
    dropped: u64,
}

impl ChannelSink {
    pub fn new(tx: Sender<DisplayReading>) -> Self {
        Self { tx, dropped: 0 }
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl DisplaySink for ChannelSink {
    fn show(&mut self, reading: &DisplayReading) {
        match self.tx.try_send(reading.clone()) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped += 1;
            }
            Err(TrySendError::Disconnected(_)) => {
                self.dropped += 1;
                log::trace!("display channel disconnected");
            }
        }
    }
}
