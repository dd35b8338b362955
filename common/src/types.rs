//! Core value types shared by the ledger and its plugins

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use thiserror::Error;

/// Errors raised when constructing value types from raw ledger data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeError {
    /// Price legs must carry strictly positive amounts
    #[error("non-positive amount in price: {base} / {quote}")]
    NonPositiveAmount {
        /// Base leg
        base: AssetAmount,
        /// Quote leg
        quote: AssetAmount,
    },

    /// A price needs two distinct assets
    #[error("price base and quote share asset {0}")]
    SameAsset(AssetId),
}

/// Identifier of a tradable asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetId(pub u32);

impl AssetId {
    /// Create a new asset id
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "1.3.{}", self.0)
    }
}

/// Integer amount of an asset in its smallest unit
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ShareAmount(pub i64);

impl ShareAmount {
    /// Create from raw units
    #[must_use]
    pub const fn new(units: i64) -> Self {
        Self(units)
    }

    /// Raw units
    #[must_use]
    pub const fn as_i64(&self) -> i64 {
        self.0
    }

    /// Addition that reports overflow instead of wrapping
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(sum) => Some(Self(sum)),
            None => None,
        }
    }

    /// True for amounts greater than zero
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for ShareAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An amount of one specific asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetAmount {
    /// Amount in smallest units
    pub amount: ShareAmount,
    /// Asset the amount is denominated in
    pub asset_id: AssetId,
}

impl AssetAmount {
    /// Create a new asset amount
    #[must_use]
    pub const fn new(amount: i64, asset_id: AssetId) -> Self {
        Self {
            amount: ShareAmount(amount),
            asset_id,
        }
    }
}

impl fmt::Display for AssetAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.asset_id)
    }
}

/// Exchange ratio `base / quote` between two amounts.
///
/// Equality and ordering compare the ratio value by cross-multiplication in
/// `i128`, so `100/10 == 200/20` and no floating point is involved. Both legs
/// are expected to be positive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PriceRatio {
    /// Base leg
    pub base: ShareAmount,
    /// Quote leg
    pub quote: ShareAmount,
}

impl PriceRatio {
    /// Create a ratio from two raw amounts
    #[must_use]
    pub const fn new(base: ShareAmount, quote: ShareAmount) -> Self {
        Self { base, quote }
    }
}

impl PartialEq for PriceRatio {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PriceRatio {}

impl PartialOrd for PriceRatio {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PriceRatio {
    fn cmp(&self, other: &Self) -> Ordering {
        // a/b ? c/d  <=>  a*d ? c*b  for positive b, d
        let lhs = i128::from(self.base.0) * i128::from(other.quote.0);
        let rhs = i128::from(other.base.0) * i128::from(self.quote.0);
        lhs.cmp(&rhs)
    }
}

impl fmt::Display for PriceRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Price of `base` expressed in `quote`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    /// Base leg
    pub base: AssetAmount,
    /// Quote leg
    pub quote: AssetAmount,
}

impl Price {
    /// Build a price, rejecting identical assets and non-positive amounts
    pub fn new(base: AssetAmount, quote: AssetAmount) -> Result<Self, TypeError> {
        if base.asset_id == quote.asset_id {
            return Err(TypeError::SameAsset(base.asset_id));
        }
        if !base.amount.is_positive() || !quote.amount.is_positive() {
            return Err(TypeError::NonPositiveAmount { base, quote });
        }
        Ok(Self { base, quote })
    }

    /// Ratio of the two amounts, for exact comparison
    #[must_use]
    pub const fn ratio(&self) -> PriceRatio {
        PriceRatio::new(self.base.amount, self.quote.amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.base, self.quote)
    }
}

/// Block timestamp in whole seconds since the UNIX epoch
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BlockTime(pub u32);

impl BlockTime {
    /// The epoch
    pub const EPOCH: Self = Self(0);

    /// Create from seconds since the epoch
    #[must_use]
    pub const fn from_secs(secs: u32) -> Self {
        Self(secs)
    }

    /// Seconds since the epoch
    #[must_use]
    pub const fn as_secs(&self) -> u32 {
        self.0
    }

    /// Convert to a UTC date-time for display and external APIs
    #[must_use]
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(i64::from(self.0), 0)
    }
}

impl fmt::Display for BlockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S")),
            None => write!(f, "{}s", self.0),
        }
    }
}
