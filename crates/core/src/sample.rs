use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Wall-clock instant attached to every sample.
pub type Timestamp = DateTime<Utc>;

/// Source label for samples pushed by a live subscription.
pub const LIVE_SOURCE: &str = "live";

/// Source label for samples returned by an archive query.
pub const ARCHIVE_SOURCE: &str = "archive";

/// Alarm severity reported alongside a value.
///
/// `Undefined` marks a value that cannot be trusted at all (disconnected
/// channel, missing hardware); such a sample is never extended to "now".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Ok,
    Minor,
    Major,
    Invalid,
    Undefined,
}

impl Severity {
    #[must_use]
    pub fn is_undefined(self) -> bool {
        matches!(self, Severity::Undefined)
    }
}

/// Payload of a sample: a single number or an array (waveform).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Scalar(f64),
    Waveform(Arc<[f64]>),
}

impl Value {
    /// Scalar to plot for this value.
    ///
    /// Scalars ignore `waveform_index`; waveforms return the selected
    /// element, or `None` when the array is shorter than the index.
    #[must_use]
    pub fn element(&self, waveform_index: usize) -> Option<f64> {
        match self {
            Value::Scalar(v) => Some(*v),
            Value::Waveform(w) => w.get(waveform_index).copied(),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Scalar(v)
    }
}

impl From<Vec<f64>> for Value {
    fn from(v: Vec<f64>) -> Self {
        Value::Waveform(v.into())
    }
}

/// One timestamped process value.
///
/// Samples are immutable once built; [`Sample::with_time`] returns a copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    time:       Timestamp,
    value:      Value,
    severity:   Severity,
    source:     Arc<str>,
    /// `false` when the source had no timestamp of its own.
    time_valid: bool,
}

impl Sample {
    pub fn new(source: impl Into<Arc<str>>, time: Timestamp, value: impl Into<Value>) -> Self {
        Self {
            time,
            value: value.into(),
            severity: Severity::Ok,
            source: source.into(),
            time_valid: true,
        }
    }

    /// A sample whose source did not supply a usable timestamp.
    ///
    /// The aggregator stamps it with the arrival time.
    pub fn untimed(source: impl Into<Arc<str>>, value: impl Into<Value>) -> Self {
        Self {
            time: DateTime::<Utc>::UNIX_EPOCH,
            value: value.into(),
            severity: Severity::Ok,
            source: source.into(),
            time_valid: false,
        }
    }

    #[must_use]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Copy of this sample moved to `time`; the new timestamp counts as valid.
    #[must_use]
    pub fn with_time(&self, time: Timestamp) -> Self {
        Self {
            time,
            time_valid: true,
            ..self.clone()
        }
    }

    /// Copy of this sample relabeled with another source.
    #[must_use]
    pub fn with_source(&self, source: impl Into<Arc<str>>) -> Self {
        Self {
            source: source.into(),
            ..self.clone()
        }
    }

    pub fn time(&self) -> Timestamp {
        self.time
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_time_valid(&self) -> bool {
        self.time_valid
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.time.format("%Y-%m-%d %H:%M:%S%.6f"))?;
        match &self.value {
            Value::Scalar(v) => write!(f, "{v}")?,
            Value::Waveform(w) => write!(f, "[{} elements]", w.len())?,
        }
        write!(f, " {:?} ({})", self.severity, self.source)
    }
}

/// A sample as seen by the plot: the raw sample plus the waveform element
/// selected for display.
#[derive(Debug, Clone, PartialEq)]
pub struct PlotSample {
    sample:         Sample,
    waveform_index: usize,
}

impl PlotSample {
    pub fn new(sample: Sample, waveform_index: usize) -> Self {
        Self { sample, waveform_index }
    }

    pub fn time(&self) -> Timestamp {
        self.sample.time()
    }

    pub fn severity(&self) -> Severity {
        self.sample.severity()
    }

    pub fn source(&self) -> &str {
        self.sample.source()
    }

    pub fn value(&self) -> &Value {
        self.sample.value()
    }

    pub fn waveform_index(&self) -> usize {
        self.waveform_index
    }

    /// Value to plot, `None` if the selected waveform element is missing.
    pub fn y(&self) -> Option<f64> {
        self.sample.value().element(self.waveform_index)
    }

    pub fn sample(&self) -> &Sample {
        &self.sample
    }

    pub fn into_sample(self) -> Sample {
        self.sample
    }
}

impl fmt::Display for PlotSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.sample, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waveform_element_selection() {
        let value = Value::from(vec![1.0, 2.0, 3.0]);
        assert_eq!(value.element(1), Some(2.0));
        assert_eq!(value.element(3), None);
        assert_eq!(Value::Scalar(4.5).element(7), Some(4.5));
    }

    #[test]
    fn with_time_marks_time_valid() {
        let untimed = Sample::untimed(LIVE_SOURCE, 1.0);
        assert!(!untimed.is_time_valid());

        let now = Utc::now();
        let stamped = untimed.with_time(now);
        assert!(stamped.is_time_valid());
        assert_eq!(stamped.time(), now);
        assert_eq!(stamped.value(), untimed.value());
    }

    #[test]
    fn only_undefined_severity_is_undefined() {
        assert!(Severity::Undefined.is_undefined());
        assert!(!Severity::Invalid.is_undefined());
        assert!(!Severity::Ok.is_undefined());
    }
}
