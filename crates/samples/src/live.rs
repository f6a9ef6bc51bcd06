use std::fmt;
use trend_core::{PlotSample, Range, Result, Sample, Severity, TimeRange, TrendError, ValueRange};

/// Default number of live samples kept per item.
pub const DEFAULT_CAPACITY: usize = 5_000;

/// Fixed-capacity ring buffer of the most recent live samples.
///
/// Storage is allocated once per capacity. Until the buffer is full, samples
/// are pushed in order and `start` stays 0; afterwards each append overwrites
/// the slot at `start` and advances it.
#[derive(Debug)]
pub struct LiveSamples {
    buf:              Vec<Sample>,
    capacity:         usize,
    /// Slot of the oldest sample.
    start:            usize,
    waveform_index:   usize,
    have_new_samples: bool,
}

impl LiveSamples {
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self {
            buf: allocate(capacity)?,
            capacity,
            start: 0,
            waveform_index: 0,
            have_new_samples: false,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Resize the ring, keeping the newest `min(size, capacity)` samples.
    ///
    /// On error the buffer is left exactly as it was.
    pub fn set_capacity(&mut self, capacity: usize) -> Result<()> {
        let mut buf = allocate(capacity)?;
        let keep = self.buf.len().min(capacity);
        let dropped = self.buf.len() - keep;
        buf.extend(self.iter().skip(dropped).cloned());

        self.buf = buf;
        self.capacity = capacity;
        self.start = 0;
        if dropped > 0 {
            self.have_new_samples = true;
        }
        Ok(())
    }

    /// Add a sample, evicting the oldest one if the buffer is full.
    pub fn append(&mut self, sample: Sample) {
        if self.buf.len() < self.capacity {
            self.buf.push(sample);
        } else {
            self.buf[self.start] = sample;
            self.start = (self.start + 1) % self.capacity;
        }
        self.have_new_samples = true;
    }

    pub fn size(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buf.len() == self.capacity
    }

    /// Sample `index` counted from the oldest one held.
    pub fn get(&self, index: usize) -> Result<PlotSample> {
        self.sample(index)
            .map(|s| PlotSample::new(s.clone(), self.waveform_index))
            .ok_or(TrendError::IndexOutOfRange { index, size: self.buf.len() })
    }

    pub fn oldest(&self) -> Option<&Sample> {
        self.sample(0)
    }

    pub fn newest(&self) -> Option<&Sample> {
        self.buf.len().checked_sub(1).and_then(|last| self.sample(last))
    }

    /// Samples from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Sample> + '_ {
        let (wrapped, head) = self.buf.split_at(self.start);
        head.iter().chain(wrapped)
    }

    pub fn set_waveform_index(&mut self, index: usize) {
        self.waveform_index = index;
    }

    pub fn clear(&mut self) {
        self.buf.clear();
        self.start = 0;
        self.have_new_samples = true;
    }

    /// Earliest and latest time held. Live samples may arrive out of order.
    pub fn time_range(&self) -> Option<TimeRange> {
        Range::covering(self.iter().map(Sample::time))
    }

    pub fn value_range(&self) -> Option<ValueRange> {
        Range::covering(
            self.iter()
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

    fn sample(&self, index: usize) -> Option<&Sample> {
        if index >= self.buf.len() {
            return None;
        }
        self.buf.get((self.start + index) % self.buf.len())
    }
}

/// Reserve the ring storage up front, reporting allocation failure as an error.
fn allocate(capacity: usize) -> Result<Vec<Sample>> {
    if capacity == 0 {
        return Err(TrendError::Capacity {
            requested: 0,
            reason: "capacity must be at least 1".into(),
        });
    }
    let mut buf = Vec::new();
    buf.try_reserve_exact(capacity)
        .map_err(|e| TrendError::Capacity { requested: capacity, reason: e.to_string() })?;
    Ok(buf)
}

impl fmt::Display for LiveSamples {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} of {} samples", self.buf.len(), self.capacity)?;
        for (i, sample) in self.iter().enumerate() {
            write!(f, "\n    {i:5}: {sample}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use trend_core::{Timestamp, LIVE_SOURCE};

    fn at(secs: i64) -> Timestamp {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn sample(t: i64) -> Sample {
        Sample::new(LIVE_SOURCE, at(t), t as f64)
    }

    fn held(live: &LiveSamples) -> Vec<f64> {
        (0..live.size()).map(|i| live.get(i).unwrap().y().unwrap()).collect()
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(
            LiveSamples::new(0),
            Err(TrendError::Capacity { requested: 0, .. })
        ));
    }

    #[test]
    fn eviction_keeps_size_bounded_and_order() {
        for capacity in [1, 2, 5, 16] {
            let mut live = LiveSamples::new(capacity).unwrap();
            for k in 0..capacity * 3 {
                live.append(sample(k as i64));
                assert!(live.size() <= capacity);
                let evicted = (k + 1).saturating_sub(capacity);
                assert_eq!(live.get(0).unwrap().time(), at(evicted as i64));
                assert_eq!(live.newest().unwrap().time(), at(k as i64));
            }
            assert!(live.is_full());
        }
    }

    #[test]
    fn shrink_keeps_newest_in_order() {
        let mut live = LiveSamples::new(8).unwrap();
        for t in 0..11 {
            live.append(sample(t));
        }
        live.take_and_clear_new_samples_flag();

        live.set_capacity(3).unwrap();
        assert_eq!(live.capacity(), 3);
        assert_eq!(held(&live), vec![8.0, 9.0, 10.0]);
        assert!(live.has_new_samples());

        live.append(sample(11));
        assert_eq!(held(&live), vec![9.0, 10.0, 11.0]);
    }

    #[test]
    fn grow_keeps_everything_and_continues_filling() {
        let mut live = LiveSamples::new(3).unwrap();
        for t in 0..5 {
            live.append(sample(t));
        }
        live.set_capacity(5).unwrap();
        assert_eq!(held(&live), vec![2.0, 3.0, 4.0]);
        assert!(!live.is_full());

        live.append(sample(5));
        live.append(sample(6));
        live.append(sample(7));
        assert_eq!(held(&live), vec![3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn failed_resize_leaves_buffer_untouched() {
        let mut live = LiveSamples::new(4).unwrap();
        for t in 0..6 {
            live.append(sample(t));
        }
        let err = live.set_capacity(usize::MAX).unwrap_err();
        assert!(matches!(err, TrendError::Capacity { requested: usize::MAX, .. }));
        assert_eq!(live.capacity(), 4);
        assert_eq!(held(&live), vec![2.0, 3.0, 4.0, 5.0]);

        assert!(live.set_capacity(0).is_err());
        assert_eq!(live.capacity(), 4);
    }

    #[test]
    fn out_of_range_index() {
        let mut live = LiveSamples::new(4).unwrap();
        live.append(sample(0));
        assert!(matches!(
            live.get(1),
            Err(TrendError::IndexOutOfRange { index: 1, size: 1 })
        ));
    }

    #[test]
    fn ranges_follow_ring_content() {
        let mut live = LiveSamples::new(3).unwrap();
        assert_eq!(live.time_range(), None);
        assert_eq!(live.value_range(), None);

        for t in [5, 1, 9, 4] {
            live.append(sample(t));
        }
        // t=5 was evicted; t=9 is held even though it is not the newest.
        assert_eq!(live.time_range(), Some(Range::new(at(1), at(9))));
        assert_eq!(live.newest().unwrap().time(), at(4));
        assert_eq!(live.value_range(), Some(Range::new(1.0, 9.0)));
    }

    #[test]
    fn clear_empties_and_marks_change() {
        let mut live = LiveSamples::new(3).unwrap();
        for t in 0..5 {
            live.append(sample(t));
        }
        live.take_and_clear_new_samples_flag();
        live.clear();
        assert!(live.is_empty());
        assert!(live.has_new_samples());
        live.append(sample(9));
        assert_eq!(held(&live), vec![9.0]);
    }
}
