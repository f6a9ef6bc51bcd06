//! Sample storage for one monitored point.
//!
//! - [`HistoricSamples`]: archive query results, merged and kept in time order
//! - [`LiveSamples`]: ring buffer of the most recent live values
//! - [`PvSamples`]: both sections as one sequence, with the continuation to
//!   "now" and the history refresh heuristic

pub mod historic;
pub mod live;
pub mod pv_samples;

pub use historic::HistoricSamples;
pub use live::{LiveSamples, DEFAULT_CAPACITY};
pub use pv_samples::PvSamples;
