//! Ledger plugin wiring the engine to applied-block notifications

use crate::bucket::{BucketKey, BucketRecord, SeriesKey};
use crate::config::MarketHistoryConfig;
use crate::engine::MarketHistory;
use common::{AppliedBlockSource, AssetId};
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::{error, info};

/// Shared handle to the engine.
///
/// The applied-block observer takes the write lock for the duration of one
/// block; readers should copy what they need and release the read lock.
pub type MarketHistoryHandle = Arc<RwLock<MarketHistory>>;

/// Market history plugin
#[derive(Debug, Clone)]
pub struct MarketHistoryPlugin {
    history: MarketHistoryHandle,
}

impl MarketHistoryPlugin {
    /// Name the plugin registers under
    pub const PLUGIN_NAME: &'static str = "market_history";

    /// Build the engine and subscribe it to `source`'s applied blocks.
    ///
    /// Call once per ledger. Engine failures are returned to the ledger,
    /// which must not advance past the block.
    pub fn plugin_initialize<S>(config: MarketHistoryConfig, source: &mut S) -> Self
    where
        S: AppliedBlockSource + ?Sized,
    {
        info!(
            "Initializing {} with bucket sizes {:?}, history per size {}",
            Self::PLUGIN_NAME,
            config.bucket_sizes.iter().map(|s| s.get()).collect::<Vec<_>>(),
            config.history_per_size
        );

        let history = Arc::new(RwLock::new(MarketHistory::new(config)));
        let engine = Arc::clone(&history);
        source.on_applied_block(Box::new(move |block, applied| {
            engine
                .write()
                .apply_block(block.timestamp, applied.applied_operations())
                .map(|_| ())
                .map_err(|err| {
                    error!("Market history failed at block {}: {}", block.block_num, err);
                    anyhow::Error::new(err)
                })
        }));

        Self { history }
    }

    /// Plugin name
    #[must_use]
    pub const fn plugin_name(&self) -> &'static str {
        Self::PLUGIN_NAME
    }

    /// Shared engine handle for read-only consumers
    #[must_use]
    pub fn history(&self) -> MarketHistoryHandle {
        Arc::clone(&self.history)
    }

    /// Tracked window lengths
    #[must_use]
    pub fn tracked_buckets(&self) -> BTreeSet<NonZeroU32> {
        self.history.read().tracked_buckets().clone()
    }

    /// Windows retained per series; 0 means unbounded
    #[must_use]
    pub fn max_history(&self) -> u32 {
        self.history.read().max_history()
    }

    /// Owned copy of one series, oldest window first.
    ///
    /// Returns an empty list for an unordered pair or zero duration, which
    /// can never be stored.
    #[must_use]
    pub fn snapshot_series(
        &self,
        base: AssetId,
        quote: AssetId,
        duration: u32,
    ) -> Vec<(BucketKey, BucketRecord)> {
        let Ok(series) = SeriesKey::new(base, quote, duration) else {
            return Vec::new();
        };
        let history = self.history.read();
        history
            .index()
            .series(series)
            .map(|(key, record)| (*key, *record))
            .collect()
    }
}
