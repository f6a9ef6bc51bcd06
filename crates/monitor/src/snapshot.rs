use serde::Serialize;
use trend_core::{TimeRange, ValueRange};

/// What a plot would read from one item at a poll, for logging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSnapshot {
    pub item:          String,
    /// Logical size, including the continuation to "now".
    pub size:          usize,
    pub historic:      usize,
    pub live:          usize,
    pub live_capacity: usize,
    pub time_range:    Option<TimeRange>,
    pub value_range:   Option<ValueRange>,
    /// Value of the newest sample, if plottable.
    pub latest:        Option<f64>,
    /// Whether samples changed since the previous snapshot.
    pub changed:       bool,
}

impl TrendSnapshot {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
    }
}
