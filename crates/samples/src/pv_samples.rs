use crate::historic::HistoricSamples;
use crate::live::LiveSamples;
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;
use trend_core::{
    Clock, DataListener, PlotDataProvider, PlotSample, Range, Result, Sample, SystemClock,
    TimeRange, Timestamp, TrendError, ValueRange,
};

/// Samples of one monitored point: archived history followed by the live
/// ring buffer, presented as a single time-ordered sequence.
///
/// If the newest sample is not `Undefined`, one more element is reported at
/// the end: a copy of that sample stamped with the current time, meaning
/// "the value still holds".
///
/// All state sits behind one lock because the history's border time must
/// always match the oldest live sample. Listeners are kept separately and are
/// only called with no lock held.
pub struct PvSamples {
    inner:     Mutex<Inner>,
    listeners: Mutex<Vec<Weak<dyn DataListener>>>,
    clock:     Arc<dyn Clock>,
}

struct Inner {
    history:                    HistoricSamples,
    live:                       LiveSamples,
    since_last_refresh:         usize,
    drop_history_on_next_merge: bool,
    /// Last timestamp handed out for the continuation element.
    last_continuation:          Option<Timestamp>,
}

impl Inner {
    fn raw_size(&self) -> usize {
        self.history.size() + self.live.size()
    }

    fn raw_sample(&self, index: usize) -> Result<PlotSample> {
        let num_old = self.history.size();
        if index < num_old {
            return self.history.get(index);
        }
        self.live.get(index - num_old)
    }

    fn last_raw_sample(&self) -> Option<PlotSample> {
        self.raw_size().checked_sub(1).and_then(|last| self.raw_sample(last).ok())
    }

    /// Last raw sample, if it should be extended to `now`.
    fn continuation_base(&self, now: Timestamp) -> Option<PlotSample> {
        self.last_raw_sample()
            .filter(|last| !last.severity().is_undefined() && last.time() < now)
    }

    fn size(&self, now: Timestamp) -> usize {
        let raw = self.raw_size();
        if self.continuation_base(now).is_some() {
            raw + 1
        } else {
            raw
        }
    }

    fn get(&mut self, index: usize, now: Timestamp) -> Result<PlotSample> {
        let raw = self.raw_size();
        if index < raw {
            return self.raw_sample(index);
        }
        match self.continuation_base(now) {
            Some(last) if index == raw => {
                let time = self.last_continuation.map_or(now, |prev| prev.max(now));
                self.last_continuation = Some(time);
                Ok(PlotSample::new(last.sample().with_time(time), last.waveform_index()))
            }
            _ => Err(TrendError::IndexOutOfRange { index, size: self.size(now) }),
        }
    }

    fn update_border_time(&mut self) {
        if let Some(oldest) = self.live.oldest().map(Sample::time) {
            self.history.set_border_time(oldest);
        }
    }

    fn arm_refresh(&mut self) -> bool {
        self.since_last_refresh = 0;
        self.drop_history_on_next_merge = true;
        true
    }
}

impl PvSamples {
    /// Samples with a live ring buffer of `live_capacity` entries, using the
    /// system clock.
    pub fn new(live_capacity: usize) -> Result<Self> {
        Self::with_clock(live_capacity, Arc::new(SystemClock))
    }

    pub fn with_clock(live_capacity: usize, clock: Arc<dyn Clock>) -> Result<Self> {
        Ok(Self {
            inner: Mutex::new(Inner {
                history: HistoricSamples::new(),
                live: LiveSamples::new(live_capacity)?,
                since_last_refresh: 0,
                drop_history_on_next_merge: false,
                last_continuation: None,
            }),
            listeners: Mutex::new(Vec::new()),
            clock,
        })
    }

    // ── Listeners ─────────────────────────────────────────────────────────────

    /// Register a listener. Only a weak reference is kept.
    pub fn add_listener(&self, listener: &Arc<dyn DataListener>) {
        self.listeners.lock().push(Arc::downgrade(listener));
    }

    /// Returns `true` if the listener was registered.
    pub fn remove_listener(&self, listener: &Arc<dyn DataListener>) -> bool {
        let target = Arc::downgrade(listener);
        let mut listeners = self.listeners.lock();
        match listeners.iter().position(|l| Weak::ptr_eq(l, &target)) {
            Some(pos) => {
                listeners.remove(pos);
                true
            }
            None => false,
        }
    }

    fn notify_listeners(&self) {
        let listeners: Vec<Arc<dyn DataListener>> = {
            let mut registered = self.listeners.lock();
            registered.retain(|l| l.strong_count() > 0);
            registered.iter().filter_map(Weak::upgrade).collect()
        };
        for listener in listeners {
            listener.data_changed(self);
        }
    }

    // ── Configuration ─────────────────────────────────────────────────────────

    /// Select the waveform element to plot, then tell all listeners.
    pub fn set_waveform_index(&self, index: usize) {
        {
            let mut inner = self.inner.lock();
            inner.live.set_waveform_index(index);
            inner.history.set_waveform_index(index);
        }
        self.notify_listeners();
    }

    pub fn live_capacity(&self) -> usize {
        self.inner.lock().live.capacity()
    }

    /// Resize the live ring buffer. Fails without changes if the storage
    /// cannot be allocated.
    pub fn set_live_capacity(&self, capacity: usize) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.live.set_capacity(capacity)?;
        inner.update_border_time();
        Ok(())
    }

    // ── Data arrival ──────────────────────────────────────────────────────────

    /// Add a sample from the live subscription.
    ///
    /// Samples without a valid timestamp are stamped with the current time.
    pub fn add_live_sample(&self, sample: Sample) {
        let mut inner = self.inner.lock();
        let sample = if sample.is_time_valid() {
            sample
        } else {
            sample.with_time(self.clock.now())
        };
        inner.live.append(sample);
        // Appending may have evicted the oldest live sample.
        inner.update_border_time();
        inner.since_last_refresh += 1;
    }

    /// Add the result of an archive query to the history.
    pub fn merge_historic(&self, source: &str, batch: Vec<Sample>) {
        let mut inner = self.inner.lock();
        if inner.drop_history_on_next_merge {
            inner.drop_history_on_next_merge = false;
            debug!(source, "dropping cached history before merge");
            inner.history.clear();
            inner.update_border_time();
        }
        inner.history.merge(source, batch);
    }

    /// Delete all samples.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.history.clear();
        inner.live.clear();
        inner.last_continuation = None;
    }

    // ── Reading ───────────────────────────────────────────────────────────────

    /// Number of samples, including the continuation to "now".
    pub fn size(&self) -> usize {
        let inner = self.inner.lock();
        inner.size(self.clock.now())
    }

    pub fn get(&self, index: usize) -> Result<PlotSample> {
        let mut inner = self.inner.lock();
        let now = self.clock.now();
        inner.get(index, now)
    }

    /// All samples, read under one lock.
    pub fn samples(&self) -> Vec<PlotSample> {
        let mut inner = self.inner.lock();
        let now = self.clock.now();
        let size = inner.size(now);
        (0..size).filter_map(|i| inner.get(i, now).ok()).collect()
    }

    pub fn historic_size(&self) -> usize {
        self.inner.lock().history.size()
    }

    pub fn live_size(&self) -> usize {
        self.inner.lock().live.size()
    }

    pub fn time_range(&self) -> Option<TimeRange> {
        let inner = self.inner.lock();
        Range::union(inner.history.time_range(), inner.live.time_range())
    }

    pub fn value_range(&self) -> Option<ValueRange> {
        let inner = self.inner.lock();
        Range::union(inner.history.value_range(), inner.live.value_range())
    }

    pub fn has_new_samples(&self) -> bool {
        let inner = self.inner.lock();
        inner.history.has_new_samples() | inner.live.has_new_samples()
    }

    /// Test and reset the new-samples flag of both sections.
    pub fn take_and_clear_new_samples_flag(&self) -> bool {
        let mut inner = self.inner.lock();
        // Both sections must be reset; `a() || b()` would skip the live one.
        let history_changed = inner.history.take_and_clear_new_samples_flag();
        let live_changed = inner.live.take_and_clear_new_samples_flag();
        history_changed | live_changed
    }

    // ── Refresh heuristic ─────────────────────────────────────────────────────

    /// Decide whether cached history should be re-read for the visible
    /// window `[visible_start, visible_end]`.
    ///
    /// A positive answer also arms the next `merge_historic` to discard the
    /// cached history first.
    pub fn needs_history_refresh(&self, visible_start: Timestamp, visible_end: Timestamp) -> bool {
        let mut inner = self.inner.lock();

        // Live buffer has not rolled yet, so nothing is stale.
        if !inner.live.is_full() || inner.live.is_empty() {
            return false;
        }
        let Some(history_last) = inner.history.newest_raw_time() else {
            return false;
        };
        let (Some(live_first), Some(live_last)) = (
            inner.live.oldest().map(Sample::time),
            inner.live.newest().map(Sample::time),
        ) else {
            return false;
        };
        // Live data alone covers the visible window.
        if live_first <= visible_start {
            return false;
        }
        // Not looking at the live edge.
        if live_last > visible_end {
            return false;
        }
        if history_last < live_first {
            debug!(%history_last, %live_first, "gap between history and live data");
            return inner.arm_refresh();
        }
        // Window reaching into the future: refresh once the live buffer has
        // been replaced completely since the last refresh.
        if inner.since_last_refresh > inner.live.capacity() {
            debug!(added = inner.since_last_refresh, "live buffer rolled over since last refresh");
            return inner.arm_refresh();
        }
        false
    }
}

impl PlotDataProvider for PvSamples {
    fn size(&self) -> usize {
        PvSamples::size(self)
    }

    fn get(&self, index: usize) -> Result<PlotSample> {
        PvSamples::get(self, index)
    }

    fn time_range(&self) -> Option<TimeRange> {
        PvSamples::time_range(self)
    }

    fn value_range(&self) -> Option<ValueRange> {
        PvSamples::value_range(self)
    }

    fn has_new_samples(&self) -> bool {
        PvSamples::has_new_samples(self)
    }

    fn take_and_clear_new_samples_flag(&self) -> bool {
        PvSamples::take_and_clear_new_samples_flag(self)
    }
}

impl fmt::Debug for PvSamples {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("PvSamples")
            .field("historic", &inner.history.size())
            .field("live", &inner.live.size())
            .field("live_capacity", &inner.live.capacity())
            .field("since_last_refresh", &inner.since_last_refresh)
            .field("drop_history_on_next_merge", &inner.drop_history_on_next_merge)
            .finish()
    }
}

impl fmt::Display for PvSamples {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut inner = self.inner.lock();
        write!(f, "PV Samples\nHistory: {}\nLive Buffer: {}", inner.history, inner.live)?;
        let now = self.clock.now();
        let raw = inner.raw_size();
        if inner.size(now) != raw {
            if let Ok(continuation) = inner.get(raw, now) {
                write!(f, "\nContinuation to 'now':\n     {continuation}")?;
            }
        }
        Ok(())
    }
}
