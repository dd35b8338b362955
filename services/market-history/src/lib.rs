//! Market History Service
//!
//! Turns the trade fills applied in each block into OHLCV buckets:
//! - one series per ordered asset pair and tracked bucket size
//! - windows aligned to multiples of the bucket size
//! - bounded retention per series
//!
//! The engine runs inline in block application and is deterministic: every
//! node that applies the same blocks holds byte-identical buckets, which
//! [`BucketIndex::state_checksum`] makes easy to compare.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod bucket;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod plugin;

pub use bucket::{BucketKey, BucketRecord, SeriesKey, window_start};
pub use config::{DEFAULT_HISTORY_PER_SIZE, MarketHistoryArgs, MarketHistoryConfig};
pub use engine::{BlockSummary, MarketHistory, canonical_price, retention_cutoff};
pub use error::{MarketHistoryError, Result};
pub use index::{BucketIndex, UndoSession};
pub use plugin::{MarketHistoryHandle, MarketHistoryPlugin};
