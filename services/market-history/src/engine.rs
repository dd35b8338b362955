//! Per-block aggregation of trade fills into OHLCV buckets

use crate::bucket::{BucketRecord, SeriesKey, window_start};
use crate::config::MarketHistoryConfig;
use crate::error::{MarketHistoryError, Result};
use crate::index::{BucketIndex, UndoSession};
use common::{AssetId, BlockTime, FillOrder, OperationHistory, Price, TypeError};
use std::collections::BTreeSet;
use std::num::NonZeroU32;
use tracing::{debug, info, trace};

/// What one block did to the store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockSummary {
    /// Fill operations in the block, both sides counted
    pub fills_seen: usize,
    /// Fills that passed the canonical-pair filter
    pub fills_aggregated: usize,
    /// Windows opened
    pub buckets_created: usize,
    /// Windows updated in place
    pub buckets_updated: usize,
    /// Windows evicted
    pub buckets_removed: usize,
}

impl BlockSummary {
    /// True if the block mutated the store
    #[must_use]
    pub const fn changed(&self) -> bool {
        self.buckets_created + self.buckets_updated + self.buckets_removed > 0
    }
}

/// Market history engine: configuration plus the bucket store it owns
#[derive(Debug, Clone, Default)]
pub struct MarketHistory {
    config: MarketHistoryConfig,
    index: BucketIndex,
}

impl MarketHistory {
    /// Engine with an empty store
    #[must_use]
    pub fn new(config: MarketHistoryConfig) -> Self {
        Self {
            config,
            index: BucketIndex::new(),
        }
    }

    /// Tracked window lengths
    #[must_use]
    pub const fn tracked_buckets(&self) -> &BTreeSet<NonZeroU32> {
        &self.config.bucket_sizes
    }

    /// Windows retained per series; 0 means unbounded
    #[must_use]
    pub const fn max_history(&self) -> u32 {
        self.config.history_per_size
    }

    /// Read access to the store
    #[must_use]
    pub const fn index(&self) -> &BucketIndex {
        &self.index
    }

    /// Aggregate one block's applied operations.
    ///
    /// Either every fill of the block is reflected in the store or, on error,
    /// the store is left exactly as it was before the call.
    pub fn apply_block(
        &mut self,
        now: BlockTime,
        operations: &[OperationHistory],
    ) -> Result<BlockSummary> {
        let mut summary = BlockSummary::default();
        if !self.config.is_enabled() {
            return Ok(summary);
        }

        let mut session = self.index.undo_session();
        let mut touched = BTreeSet::new();

        for (op_index, entry) in operations.iter().enumerate() {
            let Some(fill) = entry.op.as_fill() else {
                continue;
            };
            summary.fills_seen += 1;

            let trade = canonical_price(fill)
                .map_err(|source| MarketHistoryError::MalformedFill { op_index, source })?;
            let Some(trade) = trade else {
                trace!("Skipping mirrored fill of order {}", fill.order_id);
                continue;
            };
            summary.fills_aggregated += 1;
            trace!("Processing fill of order {}: {}", fill.order_id, trade);

            for &duration in &self.config.bucket_sizes {
                let series = SeriesKey::for_price(&trade, duration);
                let key = series.bucket(window_start(now, duration));

                if session.find(&key).is_some() {
                    session.modify(&key, |record| {
                        *record = record
                            .merged(trade.ratio())
                            .ok_or(MarketHistoryError::VolumeOverflow(key))?;
                        Ok(())
                    })?;
                    summary.buckets_updated += 1;
                    debug!("Updated bucket {}", key);
                } else {
                    session.insert(key, BucketRecord::from_trade(trade.ratio()))?;
                    summary.buckets_created += 1;
                    debug!("Created bucket {}", key);
                }
                touched.insert((series, duration));
            }
        }

        if self.config.evicts() {
            for &(series, duration) in &touched {
                let cutoff = retention_cutoff(now, duration, self.config.history_per_size);
                summary.buckets_removed += evict_before(&mut session, series, cutoff)?;
            }
        }

        session.commit();

        if summary.changed() {
            info!(
                "Market history at {}: {} fills aggregated, {} created, {} updated, {} removed",
                now,
                summary.fills_aggregated,
                summary.buckets_created,
                summary.buckets_updated,
                summary.buckets_removed
            );
        }
        Ok(summary)
    }
}

/// Canonical price of a fill, or `None` for the mirrored side.
///
/// Each match emits two fills with `pays`/`receives` swapped; only the one
/// with `pays.asset_id < receives.asset_id` is aggregated. Both sides are
/// validated, so a malformed mirror is rejected rather than skipped.
pub fn canonical_price(fill: &FillOrder) -> std::result::Result<Option<Price>, TypeError> {
    let (base, quote): (AssetId, AssetId) = (fill.pays.asset_id, fill.receives.asset_id);
    if base == quote {
        return Err(TypeError::SameAsset(base));
    }
    if !fill.pays.amount.is_positive() || !fill.receives.amount.is_positive() {
        return Err(TypeError::NonPositiveAmount {
            base: fill.pays,
            quote: fill.receives,
        });
    }
    if base > quote {
        return Ok(None);
    }
    Price::new(fill.pays, fill.receives).map(Some)
}

/// Oldest window start kept for a series at `now`.
///
/// Measured from the start of the window containing `now`, so the current
/// window plus `max_history` earlier ones survive.
#[must_use]
pub fn retention_cutoff(now: BlockTime, duration: NonZeroU32, max_history: u32) -> u64 {
    let current = u64::from(window_start(now, duration).as_secs());
    current.saturating_sub(u64::from(duration.get()) * u64::from(max_history))
}

/// Remove every window of `series` opening before `cutoff`, oldest first
fn evict_before(session: &mut UndoSession<'_>, series: SeriesKey, cutoff: u64) -> Result<usize> {
    let stale: Vec<_> = session
        .series(series)
        .take_while(|(key, _)| u64::from(key.window_open().as_secs()) < cutoff)
        .map(|(key, _)| *key)
        .collect();

    for key in &stale {
        let removed = session.remove(key)?;
        debug!("Removed bucket {} ({})", key, removed);
    }
    Ok(stale.len())
}
