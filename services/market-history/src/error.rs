//! Market history error types

use crate::bucket::BucketKey;
use common::{AssetId, TypeError};
use thiserror::Error;

/// Failures raised while maintaining market history.
///
/// None of these are recoverable for the block being processed: the engine
/// rolls the store back and the ledger decides what to do with the block.
#[derive(Debug, Error)]
pub enum MarketHistoryError {
    /// A fill carried data the ledger should never have accepted
    #[error("malformed fill at operation {op_index}: {source}")]
    MalformedFill {
        /// Position of the operation in the block's history
        op_index: usize,
        /// Underlying validation failure
        #[source]
        source: TypeError,
    },

    /// Bucket keys need `base < quote`
    #[error("bucket key requires base < quote, got {base} / {quote}")]
    UnorderedPair {
        /// Offered base
        base: AssetId,
        /// Offered quote
        quote: AssetId,
    },

    /// Bucket keys need a positive duration
    #[error("bucket duration must be positive")]
    ZeroDuration,

    /// Insert on an existing key
    #[error("bucket {0} already exists")]
    DuplicateBucket(BucketKey),

    /// Modify or remove on a missing key
    #[error("bucket {0} not found")]
    UnknownBucket(BucketKey),

    /// Running volume no longer fits the amount type
    #[error("volume overflow in bucket {0}")]
    VolumeOverflow(BucketKey),

    /// Store snapshot could not be encoded
    #[error("snapshot encoding failed: {0}")]
    Snapshot(#[from] bincode::Error),
}

/// Result alias for market history operations
pub type Result<T> = std::result::Result<T, MarketHistoryError>;
