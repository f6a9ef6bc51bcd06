pub mod clock;
pub mod error;
pub mod event;
pub mod provider;
pub mod range;
pub mod sample;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Result, TrendError};
pub use event::Message;
pub use provider::{DataListener, PlotDataProvider};
pub use range::{Range, TimeRange, ValueRange};
pub use sample::{PlotSample, Sample, Severity, Timestamp, Value, ARCHIVE_SOURCE, LIVE_SOURCE};
