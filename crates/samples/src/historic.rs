use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use trend_core::{PlotSample, Range, Result, Sample, Severity, TimeRange, Timestamp, TrendError, ValueRange};

/// Samples obtained from archive queries, kept in time order.
///
/// Samples at or after the border time stay in memory but are hidden from
/// `size`/`get` because the live ring buffer covers that period.
#[derive(Debug, Default)]
pub struct HistoricSamples {
    samples:          Vec<Sample>,
    border_time:      Option<Timestamp>,
    /// Number of samples before `border_time`.
    visible:          usize,
    waveform_index:   usize,
    have_new_samples: bool,
}

impl HistoricSamples {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge the result of one archive query.
    ///
    /// The batch replaces samples previously merged under the same `source`
    /// label inside the batch's time span, and samples of any label sharing
    /// one of its exact timestamps. The batch does not need to be sorted;
    /// duplicate timestamps inside it keep the last occurrence.
    pub fn merge(&mut self, source: &str, mut batch: Vec<Sample>) {
        if batch.is_empty() {
            return;
        }

        batch.sort_by_key(Sample::time);
        batch.reverse();
        batch.dedup_by_key(|s| s.time());
        batch.reverse();

        let label: Arc<str> = source.into();
        let batch: Vec<Sample> = batch
            .into_iter()
            .map(|s| if s.source() == source { s } else { s.with_source(label.clone()) })
            .collect();

        let first = batch[0].time();
        let last = batch[batch.len() - 1].time();
        let times: HashSet<Timestamp> = batch.iter().map(Sample::time).collect();

        let before = self.samples.len();
        self.samples.retain(|s| {
            let same_label_overlap = s.source() == source && s.time() >= first && s.time() <= last;
            !same_label_overlap && !times.contains(&s.time())
        });
        let replaced = before - self.samples.len();
        if replaced > 0 {
            warn!(source, replaced, "historic batch overlaps cached samples; newest batch wins");
        }

        debug!(source, added = batch.len(), %first, %last, "merging historic samples");
        self.samples.extend(batch);
        self.samples.sort_by_key(Sample::time);
        self.recount();
        self.have_new_samples = true;
    }

    /// Hide samples at or after `time`. Nothing is deleted.
    pub fn set_border_time(&mut self, time: Timestamp) {
        if self.border_time == Some(time) {
            return;
        }
        self.border_time = Some(time);
        let old = self.visible;
        self.recount();
        if self.visible != old {
            self.have_new_samples = true;
        }
    }

    pub fn border_time(&self) -> Option<Timestamp> {
        self.border_time
    }

    pub fn set_waveform_index(&mut self, index: usize) {
        self.waveform_index = index;
    }

    /// Drop all samples and the border time.
    pub fn clear(&mut self) {
        self.samples.clear();
        self.border_time = None;
        self.visible = 0;
        self.have_new_samples = false;
    }

    /// Number of samples before the border time.
    pub fn size(&self) -> usize {
        self.visible
    }

    /// Number of samples held, including those hidden by the border time.
    pub fn raw_size(&self) -> usize {
        self.samples.len()
    }

    pub fn get(&self, index: usize) -> Result<PlotSample> {
        if index >= self.visible {
            return Err(TrendError::IndexOutOfRange { index, size: self.visible });
        }
        Ok(PlotSample::new(self.samples[index].clone(), self.waveform_index))
    }

    pub fn get_raw(&self, index: usize) -> Result<PlotSample> {
        self.samples
            .get(index)
            .map(|s| PlotSample::new(s.clone(), self.waveform_index))
            .ok_or(TrendError::IndexOutOfRange { index, size: self.samples.len() })
    }

    /// Time of the newest sample held, ignoring the border time.
    pub fn newest_raw_time(&self) -> Option<Timestamp> {
        self.samples.last().map(Sample::time)
    }

    pub fn time_range(&self) -> Option<TimeRange> {
        let visible = &self.samples[..self.visible];
        match (visible.first(), visible.last()) {
            (Some(first), Some(last)) => Some(Range::new(first.time(), last.time())),
            _ => None,
        }
    }

    pub fn value_range(&self) -> Option<ValueRange> {
        Range::covering(
            self.samples[..self.visible]
                .iter()
                .filter(|s| s.severity() != Severity::Undefined)
                .filter_map(|s| s.value().element(self.waveform_index))
                .filter(|v| v.is_finite()),
        )
    }

    pub fn has_new_samples(&self) -> bool {
        self.have_new_samples
    }

    pub fn take_and_clear_new_samples_flag(&mut self) -> bool {
        std::mem::take(&mut self.have_new_samples)
    }

    fn recount(&mut self) {
        self.visible = match self.border_time {
            Some(border) => self.samples.partition_point(|s| s.time() < border),
            None => self.samples.len(),
        };
    }
}

impl fmt::Display for HistoricSamples {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} samples", self.visible, self.samples.len())?;
        if let Some(border) = self.border_time {
            write!(f, " before {border}")?;
        }
        for (i, sample) in self.samples.iter().enumerate() {
            let marker = if i < self.visible { ' ' } else { '-' };
            write!(f, "\n   {marker}{i:5}: {sample}")?;
        }
        Ok(())
    }
}
