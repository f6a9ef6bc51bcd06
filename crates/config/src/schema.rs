use serde::{Deserialize, Serialize};

/// Root configuration structure parsed from `trend.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    /// Settings shared by all items.
    pub global: GlobalConfig,
    /// Monitored points, one aggregator each.
    pub items: Vec<ItemConfig>,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            global: GlobalConfig::default(),
            items: vec![
                ItemConfig::new("cpu", ItemKind::Cpu),
                ItemConfig::new("memory", ItemKind::Memory),
            ],
        }
    }
}

impl TrendConfig {
    /// Ring capacity for `item`, falling back to the global default.
    pub fn live_capacity(&self, item: &ItemConfig) -> usize {
        item.live_capacity.unwrap_or(self.global.live_capacity)
    }

    pub fn item(&self, name: &str) -> Option<&ItemConfig> {
        self.items.iter().find(|i| i.name == name)
    }
}

/// Global settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Default number of live samples kept per item.
    pub live_capacity: usize,
    /// Live source poll period in milliseconds.
    pub sample_interval_ms: u64,
    /// How often the plot is polled and the refresh heuristic evaluated.
    pub refresh_check_ms: u64,
    /// Width of the visible window, ending at "now", in seconds.
    pub time_span_secs: u64,
    /// Samples kept per item by the in-memory archive.
    pub archive_retention: usize,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            live_capacity:      5_000,
            sample_interval_ms: 1_000,
            refresh_check_ms:   2_000,
            time_span_secs:     600,
            archive_retention:  100_000,
        }
    }
}

/// What a monitored point reads from the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    /// Per-core CPU usage, as a waveform.
    #[default]
    Cpu,
    /// RAM usage in percent.
    Memory,
    /// Battery charge in percent (undefined without a battery).
    Battery,
}

/// Config block for a single monitored point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemConfig {
    /// Unique item name, e.g. `"cpu"`.
    pub name: String,
    #[serde(default)]
    pub kind: ItemKind,
    /// Waveform element to plot for array-valued items.
    #[serde(default)]
    pub waveform_index: usize,
    /// Overrides `global.live_capacity`.
    #[serde(default)]
    pub live_capacity: Option<usize>,
}

impl ItemConfig {
    pub fn new(name: impl Into<String>, kind: ItemKind) -> Self {
        Self {
            name: name.into(),
            kind,
            waveform_index: 0,
            live_capacity: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let cfg: TrendConfig = toml::from_str("").unwrap();
        assert_eq!(cfg, TrendConfig::default());
    }

    #[test]
    fn parse_items_and_overrides() {
        let cfg: TrendConfig = toml::from_str(
            r#"
            [global]
            live_capacity = 300

            [[items]]
            name = "core2"
            kind = "cpu"
            waveform_index = 2
            live_capacity = 50

            [[items]]
            name = "bat"
            kind = "battery"
            "#,
        )
        .unwrap();

        assert_eq!(cfg.global.live_capacity, 300);
        assert_eq!(cfg.global.sample_interval_ms, 1_000);
        assert_eq!(cfg.items.len(), 2);

        let core2 = cfg.item("core2").unwrap();
        assert_eq!(core2.waveform_index, 2);
        assert_eq!(cfg.live_capacity(core2), 50);

        let bat = cfg.item("bat").unwrap();
        assert_eq!(bat.kind, ItemKind::Battery);
        assert_eq!(cfg.live_capacity(bat), 300);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let res: Result<TrendConfig, _> = toml::from_str("[[items]]\nname = \"x\"\nkind = \"gpu\"\n");
        assert!(res.is_err());
    }
}
