pub mod schema;
pub mod watcher;

pub use schema::{GlobalConfig, ItemConfig, ItemKind, TrendConfig};
pub use watcher::ConfigWatcher;

use std::path::{Path, PathBuf};
use trend_core::{Result, TrendError};

/// Load configuration from a TOML file.  Returns `TrendConfig::default()` if
/// the file doesn't exist so the monitor always has sensible defaults.
pub fn load(path: impl AsRef<Path>) -> Result<TrendConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(
            "Config file not found at '{}'; using defaults.",
            path.display()
        );
        return Ok(TrendConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| TrendError::Config(format!("cannot read '{}': {e}", path.display())))?;

    parse(&raw)
}

/// Parse and validate configuration text.
pub fn parse(raw: &str) -> Result<TrendConfig> {
    let config: TrendConfig =
        toml::from_str(raw).map_err(|e| TrendError::Config(format!("TOML parse error: {e}")))?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &TrendConfig) -> Result<()> {
    for item in &config.items {
        if config.live_capacity(item) == 0 {
            return Err(TrendError::Config(format!(
                "item '{}': live_capacity must be at least 1",
                item.name
            )));
        }
    }
    let mut names: Vec<&str> = config.items.iter().map(|i| i.name.as_str()).collect();
    names.sort_unstable();
    if let Some(dup) = names.windows(2).find(|w| w[0] == w[1]) {
        return Err(TrendError::Config(format!("duplicate item name '{}'", dup[0])));
    }
    Ok(())
}

/// Return the default config path, honouring `$XDG_CONFIG_HOME`.
pub fn default_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("trend").join("trend.toml")
}
