use crate::listener::LoggingListener;
use crate::snapshot::TrendSnapshot;
use chrono::Duration;
use std::sync::Arc;
use tracing::{debug, info};
use trend_config::{ItemConfig, ItemKind};
use trend_core::{DataListener, Result, Sample, Timestamp};
use trend_samples::PvSamples;
use trend_system::SystemReading;

/// One monitored point: its configuration and its samples.
pub struct TrendItem {
    name:              String,
    kind:              ItemKind,
    waveform_index:    usize,
    samples:           Arc<PvSamples>,
    /// Keeps the weak registration in `samples` alive.
    _listener:         Arc<dyn DataListener>,
    history_requested: bool,
}

impl TrendItem {
    pub fn new(config: &ItemConfig, live_capacity: usize) -> Result<Self> {
        let samples = Arc::new(PvSamples::new(live_capacity)?);
        let listener: Arc<dyn DataListener> = Arc::new(LoggingListener::new(&config.name));
        samples.add_listener(&listener);
        if config.waveform_index != 0 {
            samples.set_waveform_index(config.waveform_index);
        }

        Ok(Self {
            name: config.name.clone(),
            kind: config.kind,
            waveform_index: config.waveform_index,
            samples,
            _listener: listener,
            history_requested: false,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ItemKind {
        self.kind
    }

    pub fn samples(&self) -> &Arc<PvSamples> {
        &self.samples
    }

    /// The live sample this item takes from a system reading.
    pub fn sample_from(&self, reading: &SystemReading) -> Sample {
        match self.kind {
            ItemKind::Cpu     => reading.cpu_sample(),
            ItemKind::Memory  => reading.memory_sample(),
            ItemKind::Battery => reading.battery_sample(),
        }
    }

    /// Apply a reloaded configuration. The kind of an item never changes.
    pub fn apply_config(&mut self, config: &ItemConfig, live_capacity: usize) -> Result<()> {
        if live_capacity != self.samples.live_capacity() {
            info!(item = %self.name, live_capacity, "resizing live buffer");
            self.samples.set_live_capacity(live_capacity)?;
        }
        if config.waveform_index != self.waveform_index {
            self.waveform_index = config.waveform_index;
            self.samples.set_waveform_index(config.waveform_index);
        }
        Ok(())
    }

    /// Window `[now - span, now]` to read from the archive, if history is
    /// needed at this poll.
    ///
    /// The first request is made once the live buffer has filled up, as
    /// older data then only exists in the archive. Later requests follow the
    /// stale-history heuristic.
    pub fn poll(&mut self, now: Timestamp, span: Duration) -> Option<(Timestamp, Timestamp)> {
        let start = now - span;
        if !self.history_requested {
            if self.samples.live_size() < self.samples.live_capacity() {
                return None;
            }
            self.history_requested = true;
            debug!(item = %self.name, "requesting initial history");
            return Some((start, now));
        }
        if self.samples.needs_history_refresh(start, now) {
            debug!(item = %self.name, "requesting history refresh");
            return Some((start, now));
        }
        None
    }

    pub fn snapshot(&self) -> TrendSnapshot {
        let samples = &self.samples;
        let size = samples.size();
        let latest = size.checked_sub(1).and_then(|last| samples.get(last).ok()).and_then(|s| s.y());
        TrendSnapshot {
            item:          self.name.clone(),
            size,
            historic:      samples.historic_size(),
            live:          samples.live_size(),
            live_capacity: samples.live_capacity(),
            time_range:    samples.time_range(),
            value_range:   samples.value_range(),
            latest,
            changed:       samples.take_and_clear_new_samples_flag(),
        }
    }
}
