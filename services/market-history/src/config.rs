//! Market history configuration

use anyhow::{Context, Result};
use clap::Args;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::num::NonZeroU32;

/// Windows retained per series unless configured otherwise
pub const DEFAULT_HISTORY_PER_SIZE: u32 = 1000;

/// Environment prefix for overrides, e.g. `MARKET_HISTORY_HISTORY_PER_SIZE`
const ENV_PREFIX: &str = "MARKET_HISTORY";

/// Market history configuration, static for the life of the node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketHistoryConfig {
    /// Tracked window lengths in seconds; empty disables aggregation
    pub bucket_sizes: BTreeSet<NonZeroU32>,

    /// Windows kept per series and size; 0 disables eviction
    pub history_per_size: u32,
}

impl Default for MarketHistoryConfig {
    fn default() -> Self {
        Self {
            bucket_sizes: BTreeSet::new(),
            history_per_size: DEFAULT_HISTORY_PER_SIZE,
        }
    }
}

impl MarketHistoryConfig {
    /// Config tracking the given sizes with default history
    #[must_use]
    pub fn with_bucket_sizes(sizes: impl IntoIterator<Item = NonZeroU32>) -> Self {
        Self {
            bucket_sizes: sizes.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Override the number of windows kept per series
    #[must_use]
    pub const fn history_per_size(mut self, history_per_size: u32) -> Self {
        self.history_per_size = history_per_size;
        self
    }

    /// Load from a config file (any format the `config` crate knows), with
    /// `MARKET_HISTORY_*` environment variables taking precedence
    pub fn from_file(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("bucket_sizes"),
            )
            .build()
            .with_context(|| format!("failed to read market history config {path}"))?;

        settings
            .try_deserialize()
            .with_context(|| format!("invalid market history config {path}"))
    }

    /// True when at least one bucket size is tracked
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.bucket_sizes.is_empty()
    }

    /// True when old windows are evicted
    #[must_use]
    pub const fn evicts(&self) -> bool {
        self.history_per_size != 0
    }
}

/// Command-line options for market history
#[derive(Debug, Clone, Default, Args)]
pub struct MarketHistoryArgs {
    /// Track market history by grouping fills into buckets of equal size
    /// measured in seconds; may be given more than once
    #[arg(long = "bucket-size", value_name = "SECONDS", num_args = 1..)]
    pub bucket_size: Vec<NonZeroU32>,

    /// How far back in time to track history for each bucket size, measured
    /// in the number of buckets [default: 1000]
    #[arg(long = "history-per-size", value_name = "COUNT")]
    pub history_per_size: Option<u32>,
}

impl MarketHistoryArgs {
    /// Config from command-line options alone
    #[must_use]
    pub fn into_config(self) -> MarketHistoryConfig {
        self.merge_into(MarketHistoryConfig::default())
    }

    /// Layer command-line options over a base config: sizes are added,
    /// an explicit history overrides
    #[must_use]
    pub fn merge_into(self, mut base: MarketHistoryConfig) -> MarketHistoryConfig {
        base.bucket_sizes.extend(self.bucket_size);
        if let Some(history) = self.history_per_size {
            base.history_per_size = history;
        }
        base
    }
}
