use crate::battery::BatteryState;
use trend_core::{Sample, Severity, Timestamp, LIVE_SOURCE};

/// One poll of the system resources, taken at `time`.
#[derive(Debug, Clone)]
pub struct SystemReading {
    pub time: Timestamp,
    /// Per-core CPU usage (0.0 – 100.0).
    pub cpu_per_core: Vec<f32>,
    /// RAM used in bytes.
    pub ram_used: u64,
    /// Total RAM in bytes.
    pub ram_total: u64,
    /// `None` if no battery is present.
    pub battery: Option<BatteryState>,
}

impl SystemReading {
    /// Per-core CPU usage as a waveform; element `i` is core `i`.
    pub fn cpu_sample(&self) -> Sample {
        let cores: Vec<f64> = self.cpu_per_core.iter().map(|&c| f64::from(c)).collect();
        let severity = if cores.is_empty() { Severity::Undefined } else { Severity::Ok };
        Sample::new(LIVE_SOURCE, self.time, cores).with_severity(severity)
    }

    /// RAM usage in percent.
    pub fn memory_sample(&self) -> Sample {
        if self.ram_total == 0 {
            return Sample::new(LIVE_SOURCE, self.time, f64::NAN).with_severity(Severity::Undefined);
        }
        let percent = self.ram_used as f64 / self.ram_total as f64 * 100.0;
        Sample::new(LIVE_SOURCE, self.time, percent)
    }

    /// Battery charge in percent; `Undefined` severity when there is no battery.
    pub fn battery_sample(&self) -> Sample {
        match self.battery {
            Some(state) => {
                let severity = match state.percent {
                    0..=5 if !state.charging => Severity::Major,
                    6..=15 if !state.charging => Severity::Minor,
                    _ => Severity::Ok,
                };
                Sample::new(LIVE_SOURCE, self.time, f64::from(state.percent)).with_severity(severity)
            }
            None => Sample::new(LIVE_SOURCE, self.time, f64::NAN).with_severity(Severity::Undefined),
        }
    }
}
