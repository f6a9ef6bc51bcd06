use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use trend_core::{Result, Sample, Timestamp, TrendError, ARCHIVE_SOURCE};

/// Source of historic samples for an item.
///
/// Implementations may block; the monitor calls them from a blocking task.
pub trait ArchiveReader: Send + Sync {
    /// Samples of `item` with timestamps in `[start, end]`, oldest first.
    fn read(&self, item: &str, start: Timestamp, end: Timestamp) -> Result<Vec<Sample>>;
}

/// In-memory recorder of every live sample, bounded per item.
///
/// Stands in for an archive engine: live data that scrolled out of the
/// ring buffer can be read back from here.
#[derive(Debug)]
pub struct MemoryArchive {
    retention: usize,
    channels:  Mutex<HashMap<String, VecDeque<Sample>>>,
}

impl MemoryArchive {
    pub fn new(retention: usize) -> Self {
        Self {
            retention: retention.max(1),
            channels:  Mutex::new(HashMap::new()),
        }
    }

    /// Store a sample, evicting the oldest one of the item past retention.
    pub fn record(&self, item: &str, sample: &Sample) {
        let mut channels = self.channels.lock();
        let channel = channels.entry(item.to_string()).or_default();
        if channel.len() == self.retention {
            channel.pop_front();
        }
        channel.push_back(sample.with_source(ARCHIVE_SOURCE));
    }

    pub fn len(&self, item: &str) -> usize {
        self.channels.lock().get(item).map_or(0, VecDeque::len)
    }
}

impl ArchiveReader for MemoryArchive {
    fn read(&self, item: &str, start: Timestamp, end: Timestamp) -> Result<Vec<Sample>> {
        let channels = self.channels.lock();
        let channel = channels
            .get(item)
            .ok_or_else(|| TrendError::Archive(format!("no archived data for '{item}'")))?;
        let first = channel.partition_point(|s| s.time() < start);
        Ok(channel
            .iter()
            .skip(first)
            .take_while(|s| s.time() <= end)
            .cloned()
            .collect())
    }
}
