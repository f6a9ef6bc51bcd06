use tracing::info;
use trend_core::{DataListener, PlotDataProvider};

/// Logs content changes that are not new samples.
#[derive(Debug)]
pub struct LoggingListener {
    item: String,
}

impl LoggingListener {
    pub fn new(item: impl Into<String>) -> Self {
        Self { item: item.into() }
    }
}

impl DataListener for LoggingListener {
    fn data_changed(&self, provider: &dyn PlotDataProvider) {
        let range = provider.value_range();
        info!(
            item = %self.item,
            size = provider.size(),
            lower = range.map(|r| r.lower),
            upper = range.map(|r| r.upper),
            "plotted data changed"
        );
    }
}
