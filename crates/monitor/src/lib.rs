//! Runtime for `trend`.
//!
//! Owns one [`TrendItem`] per configured point and wires together the
//! background tasks feeding them:
//! - System sampler (live samples)
//! - Archive reads (historic batches, on a blocking task)
//! - Config file watcher (live reload on change)
//! - Poll timer (plot snapshot + history refresh heuristic)

pub mod archive;
pub mod item;
pub mod listener;
pub mod snapshot;

pub use archive::{ArchiveReader, MemoryArchive};
pub use item::TrendItem;
pub use listener::LoggingListener;
pub use snapshot::TrendSnapshot;

use chrono::{Duration as TimeSpan, Utc};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time;
use tracing::{debug, error, info, warn};
use trend_config::{load as load_config, ConfigWatcher, TrendConfig};
use trend_core::{Message, Result, Timestamp, ARCHIVE_SOURCE};
use trend_samples::PvSamples;
use trend_system::SystemReading;

/// Capacity of the internal event bus.
const BUS_CAPACITY: usize = 256;

/// Upper bound for `time_span_secs` (about a century).
const MAX_TIME_SPAN_SECS: i64 = 100 * 365 * 24 * 3600;

// ── Entry point ───────────────────────────────────────────────────────────────

/// Run the monitor until Ctrl-C.
pub async fn run(config_path: PathBuf) -> Result<()> {
    let config = load_config(&config_path).unwrap_or_else(|e| {
        warn!("{e}; using defaults");
        TrendConfig::default()
    });

    let (tx, mut rx) = mpsc::channel(BUS_CAPACITY);
    let archive = Arc::new(MemoryArchive::new(config.global.archive_retention));
    let mut monitor = Monitor::new(config.clone(), config_path.clone(), archive, tx)?;

    let mut readings = trend_system::spawn_sampler(config.global.sample_interval_ms);
    let (_watcher, mut config_rx) = ConfigWatcher::spawn(&config_path);
    let mut ticker = time::interval(Duration::from_millis(config.global.refresh_check_ms.max(1)));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(items = monitor.items().len(), "monitor running");

    loop {
        let msg = tokio::select! {
            Some(reading) = readings.recv() => {
                monitor.ingest_reading(&reading);
                continue;
            }
            Some(msg) = rx.recv() => msg,
            Some(()) = config_rx.recv() => Message::ConfigReloaded,
            _ = ticker.tick() => Message::Tick,
            _ = &mut shutdown => Message::Shutdown,
        };
        if monitor.handle(msg).is_break() {
            break;
        }
    }

    Ok(())
}

// ── State ─────────────────────────────────────────────────────────────────────

/// Items plus the collaborators feeding them.
pub struct Monitor {
    config:      TrendConfig,
    config_path: PathBuf,
    items:       Vec<TrendItem>,
    archive:     Arc<MemoryArchive>,
    /// Completed archive reads come back through here.
    tx:          mpsc::Sender<Message>,
}

impl Monitor {
    pub fn new(
        config: TrendConfig,
        config_path: PathBuf,
        archive: Arc<MemoryArchive>,
        tx: mpsc::Sender<Message>,
    ) -> Result<Self> {
        let items = config
            .items
            .iter()
            .map(|item| TrendItem::new(item, config.live_capacity(item)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            config,
            config_path,
            items,
            archive,
            tx,
        })
    }

    pub fn items(&self) -> &[TrendItem] {
        &self.items
    }

    /// Samples of the named item, for a plot to read.
    pub fn samples(&self, name: &str) -> Option<Arc<PvSamples>> {
        self.item(name).map(|i| i.samples().clone())
    }

    fn item(&self, name: &str) -> Option<&TrendItem> {
        self.items.iter().find(|i| i.name() == name)
    }

    /// Turn one system reading into a live sample per item.
    pub fn ingest_reading(&mut self, reading: &SystemReading) {
        let messages: Vec<Message> = self
            .items
            .iter()
            .map(|item| Message::LiveSample {
                item:   item.name().to_string(),
                sample: item.sample_from(reading),
            })
            .collect();
        for msg in messages {
            let _ = self.handle(msg);
        }
    }

    // ── Update ────────────────────────────────────────────────────────────────

    pub fn handle(&mut self, msg: Message) -> ControlFlow<()> {
        match msg {
            Message::LiveSample { item, sample } => match self.item(&item) {
                Some(target) => {
                    self.archive.record(&item, &sample);
                    target.samples().add_live_sample(sample);
                }
                None => debug!(%item, "live sample for unknown item"),
            },
            Message::ArchiveBatch { item, source, samples } => match self.item(&item) {
                Some(target) => {
                    debug!(%item, count = samples.len(), "archive batch");
                    target.samples().merge_historic(&source, samples);
                }
                None => debug!(%item, "archive batch for removed item"),
            },
            Message::RefreshRequested { item, start, end } => self.spawn_archive_read(item, start, end),
            Message::ConfigReloaded => self.reload_config(),
            Message::Tick => self.poll(),
            Message::Shutdown => {
                info!("shutting down");
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    /// Snapshot every item and request history where needed.
    fn poll(&mut self) {
        let now = Utc::now();
        let secs = i64::try_from(self.config.global.time_span_secs).unwrap_or(MAX_TIME_SPAN_SECS);
        let span = TimeSpan::seconds(secs.min(MAX_TIME_SPAN_SECS));

        let mut requests = Vec::new();
        for item in &mut self.items {
            let snapshot = item.snapshot();
            if snapshot.changed {
                debug!(snapshot = %snapshot.to_json(), "poll");
            }
            if let Some((start, end)) = item.poll(now, span) {
                requests.push(Message::RefreshRequested {
                    item: item.name().to_string(),
                    start,
                    end,
                });
            }
        }
        for request in requests {
            let _ = self.handle(request);
        }
    }

    fn spawn_archive_read(&self, item: String, start: Timestamp, end: Timestamp) {
        let archive = self.archive.clone();
        let tx = self.tx.clone();
        tokio::task::spawn_blocking(move || match archive.read(&item, start, end) {
            Ok(samples) => {
                let msg = Message::ArchiveBatch {
                    item,
                    source: ARCHIVE_SOURCE.to_string(),
                    samples,
                };
                if tx.blocking_send(msg).is_err() {
                    debug!("monitor gone; dropping archive batch");
                }
            }
            Err(e) => warn!("archive read failed: {e}"),
        });
    }

    fn reload_config(&mut self) {
        let config = match load_config(&self.config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Config reload failed: {e}");
                return;
            }
        };
        info!("Config reloaded");
        self.apply_config(config);
    }

    /// Reconcile items with a new configuration: keep and adjust matching
    /// items, create new ones, drop the rest.
    fn apply_config(&mut self, config: TrendConfig) {
        let mut items = Vec::with_capacity(config.items.len());
        let mut old = std::mem::take(&mut self.items);

        for item_cfg in &config.items {
            let capacity = config.live_capacity(item_cfg);
            match old.iter().position(|i| i.name() == item_cfg.name && i.kind() == item_cfg.kind) {
                Some(pos) => {
                    let mut item = old.swap_remove(pos);
                    if let Err(e) = item.apply_config(item_cfg, capacity) {
                        error!(item = %item_cfg.name, "cannot apply config: {e}");
                    }
                    items.push(item);
                }
                None => match TrendItem::new(item_cfg, capacity) {
                    Ok(item) => {
                        info!(item = %item_cfg.name, "item added");
                        items.push(item);
                    }
                    Err(e) => error!(item = %item_cfg.name, "cannot create item: {e}"),
                },
            }
        }
        for removed in old {
            info!(item = %removed.name(), "item removed");
        }

        self.items = items;
        self.config = config;
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trend_config::{ItemConfig, ItemKind};
    use trend_core::{Sample, LIVE_SOURCE};

    fn monitor(capacity: usize) -> (Monitor, mpsc::Receiver<Message>) {
        let mut config = TrendConfig::default();
        config.global.live_capacity = capacity;
        config.items = vec![ItemConfig::new("cpu", ItemKind::Cpu)];
        let (tx, rx) = mpsc::channel(16);
        let archive = Arc::new(MemoryArchive::new(1_000));
        let monitor = Monitor::new(config, PathBuf::from("/nonexistent/trend.toml"), archive, tx).unwrap();
        (monitor, rx)
    }

    fn live_sample(item: &str, seconds_ago: i64) -> Message {
        Message::LiveSample {
            item:   item.to_string(),
            sample: Sample::new(LIVE_SOURCE, Utc::now() - TimeSpan::seconds(seconds_ago), vec![seconds_ago as f64]),
        }
    }

    #[tokio::test]
    async fn live_samples_reach_item_and_archive() {
        let (mut monitor, _rx) = monitor(4);
        assert!(monitor.handle(live_sample("cpu", 3)).is_continue());
        assert!(monitor.handle(live_sample("gpu", 3)).is_continue());

        assert_eq!(monitor.samples("cpu").unwrap().live_size(), 1);
        assert_eq!(monitor.archive.len("cpu"), 1);
        assert_eq!(monitor.archive.len("gpu"), 0);
    }

    #[tokio::test]
    async fn full_buffer_pulls_scrolled_out_data_from_archive() {
        let (mut monitor, mut rx) = monitor(3);
        for seconds_ago in (1..=5).rev() {
            let _ = monitor.handle(live_sample("cpu", seconds_ago));
        }
        let samples = monitor.samples("cpu").unwrap();
        assert_eq!(samples.live_size(), 3);
        assert_eq!(samples.historic_size(), 0);

        let _ = monitor.handle(Message::Tick);
        let batch = rx.recv().await.unwrap();
        assert!(matches!(&batch, Message::ArchiveBatch { samples, .. } if samples.len() == 5));
        let _ = monitor.handle(batch);

        // The two samples evicted from the ring come back as history.
        assert_eq!(samples.historic_size(), 2);
        assert_eq!(samples.get(0).unwrap().source(), ARCHIVE_SOURCE);
        assert_eq!(samples.size(), 2 + 3 + 1);
    }

    #[tokio::test]
    async fn reconfigure_keeps_adjusts_adds_and_removes_items() {
        let (mut monitor, _rx) = monitor(4);
        let _ = monitor.handle(live_sample("cpu", 1));

        let mut config = monitor.config.clone();
        config.items[0].live_capacity = Some(8);
        config.items[0].waveform_index = 0;
        config.items.push(ItemConfig::new("memory", ItemKind::Memory));
        monitor.apply_config(config.clone());

        assert_eq!(monitor.items().len(), 2);
        let cpu = monitor.samples("cpu").unwrap();
        assert_eq!(cpu.live_capacity(), 8);
        assert_eq!(cpu.live_size(), 1);

        config.items.remove(0);
        monitor.apply_config(config);
        assert!(monitor.samples("cpu").is_none());
        assert!(monitor.samples("memory").is_some());
    }

    #[tokio::test]
    async fn shutdown_breaks() {
        let (mut monitor, _rx) = monitor(4);
        assert!(monitor.handle(Message::Shutdown).is_break());
        assert!(monitor.handle(Message::ConfigReloaded).is_continue());
    }
}
