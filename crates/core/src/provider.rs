use crate::error::Result;
use crate::range::{TimeRange, ValueRange};
use crate::sample::PlotSample;

/// Read side of a sample sequence, as polled by a plot.
///
/// Indices run from `0` to `size() - 1` in time order.
pub trait PlotDataProvider: Send + Sync {
    fn size(&self) -> usize;

    fn get(&self, index: usize) -> Result<PlotSample>;

    /// Time span of all samples, `None` when there are none.
    fn time_range(&self) -> Option<TimeRange>;

    /// Value span of all samples, `None` when there are none.
    fn value_range(&self) -> Option<ValueRange>;

    fn has_new_samples(&self) -> bool;

    /// Report whether samples changed since the last call, and reset.
    fn take_and_clear_new_samples_flag(&self) -> bool;
}

/// Observer of a [`PlotDataProvider`].
///
/// Called synchronously without any provider lock held, so implementations
/// may read the provider back.
pub trait DataListener: Send + Sync {
    /// The provider's content changed in a way that is not visible through
    /// the new-samples flag (e.g. a different waveform element is shown).
    fn data_changed(&self, provider: &dyn PlotDataProvider);
}
