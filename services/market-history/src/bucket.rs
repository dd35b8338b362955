//! Bucket keys and OHLCV records

use crate::error::{MarketHistoryError, Result};
use common::{AssetId, BlockTime, Price, PriceRatio, ShareAmount};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

/// Start of the window of length `duration` that contains `now`
#[must_use]
pub const fn window_start(now: BlockTime, duration: NonZeroU32) -> BlockTime {
    let secs = now.as_secs();
    BlockTime::from_secs(secs - secs % duration.get())
}

/// One market series: an ordered asset pair at one bucket duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeriesKey {
    base: AssetId,
    quote: AssetId,
    duration: u32,
}

impl SeriesKey {
    /// Build a series key, enforcing `base < quote` and a positive duration
    pub fn new(base: AssetId, quote: AssetId, duration: u32) -> Result<Self> {
        if base >= quote {
            return Err(MarketHistoryError::UnorderedPair { base, quote });
        }
        if duration == 0 {
            return Err(MarketHistoryError::ZeroDuration);
        }
        Ok(Self {
            base,
            quote,
            duration,
        })
    }

    /// Series of a canonically ordered price at `duration`
    #[must_use]
    pub(crate) fn for_price(price: &Price, duration: NonZeroU32) -> Self {
        Self {
            base: price.base.asset_id,
            quote: price.quote.asset_id,
            duration: duration.get(),
        }
    }

    /// Base asset
    #[must_use]
    pub const fn base(&self) -> AssetId {
        self.base
    }

    /// Quote asset
    #[must_use]
    pub const fn quote(&self) -> AssetId {
        self.quote
    }

    /// Window length in seconds
    #[must_use]
    pub const fn duration(&self) -> u32 {
        self.duration
    }

    /// Key of the window opening at `window_open`
    #[must_use]
    pub const fn bucket(&self, window_open: BlockTime) -> BucketKey {
        BucketKey {
            base: self.base,
            quote: self.quote,
            duration: self.duration,
            window_open,
        }
    }

    /// Smallest possible key in the series
    #[must_use]
    pub const fn first_bucket(&self) -> BucketKey {
        self.bucket(BlockTime::EPOCH)
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}s", self.base, self.quote, self.duration)
    }
}

/// Identity of one candle window.
///
/// Field order is the sort order: `(base, quote, duration, window_open)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BucketKey {
    base: AssetId,
    quote: AssetId,
    duration: u32,
    window_open: BlockTime,
}

impl BucketKey {
    /// Build a key, enforcing `base < quote` and a positive duration
    pub fn new(
        base: AssetId,
        quote: AssetId,
        duration: u32,
        window_open: BlockTime,
    ) -> Result<Self> {
        Ok(SeriesKey::new(base, quote, duration)?.bucket(window_open))
    }

    /// Base asset
    #[must_use]
    pub const fn base(&self) -> AssetId {
        self.base
    }

    /// Quote asset
    #[must_use]
    pub const fn quote(&self) -> AssetId {
        self.quote
    }

    /// Window length in seconds
    #[must_use]
    pub const fn duration(&self) -> u32 {
        self.duration
    }

    /// Window start
    #[must_use]
    pub const fn window_open(&self) -> BlockTime {
        self.window_open
    }

    /// Series this window belongs to
    #[must_use]
    pub const fn series(&self) -> SeriesKey {
        SeriesKey {
            base: self.base,
            quote: self.quote,
            duration: self.duration,
        }
    }
}

impl fmt::Display for BucketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} open {}", self.series(), self.window_open)
    }
}

/// OHLCV aggregate of one window.
///
/// Prices are kept as raw `(base, quote)` amount pairs from the trade that
/// set them; comparisons go through [`PriceRatio`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketRecord {
    /// Base amount of the first trade
    pub open_base: ShareAmount,
    /// Quote amount of the first trade
    pub open_quote: ShareAmount,
    /// Base amount of the highest-priced trade
    pub high_base: ShareAmount,
    /// Quote amount of the highest-priced trade
    pub high_quote: ShareAmount,
    /// Base amount of the lowest-priced trade
    pub low_base: ShareAmount,
    /// Quote amount of the lowest-priced trade
    pub low_quote: ShareAmount,
    /// Base amount of the latest trade
    pub close_base: ShareAmount,
    /// Quote amount of the latest trade
    pub close_quote: ShareAmount,
    /// Sum of base amounts traded
    pub base_volume: ShareAmount,
    /// Sum of quote amounts traded
    pub quote_volume: ShareAmount,
}

impl BucketRecord {
    /// Record opened by a window's first trade
    #[must_use]
    pub const fn from_trade(trade: PriceRatio) -> Self {
        Self {
            open_base: trade.base,
            open_quote: trade.quote,
            high_base: trade.base,
            high_quote: trade.quote,
            low_base: trade.base,
            low_quote: trade.quote,
            close_base: trade.base,
            close_quote: trade.quote,
            base_volume: trade.base,
            quote_volume: trade.quote,
        }
    }

    /// Fold a later trade into the window.
    ///
    /// Returns `None` when a volume would overflow; `self` is untouched then.
    #[must_use]
    pub fn merged(&self, trade: PriceRatio) -> Option<Self> {
        let mut next = *self;
        next.base_volume = self.base_volume.checked_add(trade.base)?;
        next.quote_volume = self.quote_volume.checked_add(trade.quote)?;
        next.close_base = trade.base;
        next.close_quote = trade.quote;
        if trade > self.high() {
            next.high_base = trade.base;
            next.high_quote = trade.quote;
        }
        if trade < self.low() {
            next.low_base = trade.base;
            next.low_quote = trade.quote;
        }
        Some(next)
    }

    /// Opening price
    #[must_use]
    pub const fn open(&self) -> PriceRatio {
        PriceRatio::new(self.open_base, self.open_quote)
    }

    /// Highest price seen
    #[must_use]
    pub const fn high(&self) -> PriceRatio {
        PriceRatio::new(self.high_base, self.high_quote)
    }

    /// Lowest price seen
    #[must_use]
    pub const fn low(&self) -> PriceRatio {
        PriceRatio::new(self.low_base, self.low_quote)
    }

    /// Latest price
    #[must_use]
    pub const fn close(&self) -> PriceRatio {
        PriceRatio::new(self.close_base, self.close_quote)
    }
}

impl fmt::Display for BucketRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "O {} H {} L {} C {} V {}/{}",
            self.open(),
            self.high(),
            self.low(),
            self.close(),
            self.base_volume,
            self.quote_volume
        )
    }
}
