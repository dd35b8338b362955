//! Market History Replay Tool - rebuild buckets from a recorded block stream
//!
//! Reads blocks from a JSON-lines file, applies them to an in-memory ledger
//! with the market history plugin attached, then prints every bucket and the
//! store checksum. Two nodes that replay the same blocks must print the same
//! checksum.

use anyhow::{Context, Result};
use clap::Parser;
use common::{BlockTime, Ledger, Operation, SignedBlock};
use market_history::{MarketHistoryArgs, MarketHistoryConfig, MarketHistoryPlugin};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SERVICE_NAME: &str = "market-history-replay";
const PROGRESS_LOG_INTERVAL: u32 = 10_000;

/// Command-line interface
#[derive(Debug, Parser)]
#[command(name = SERVICE_NAME, about = "Replay blocks through market history")]
struct Cli {
    /// JSON-lines file with one block per line
    #[arg(long, value_name = "PATH")]
    blocks: PathBuf,

    /// Optional config file; command-line options are layered on top
    #[arg(long, value_name = "PATH")]
    config: Option<String>,

    /// Height of the block preceding the first one in the file
    #[arg(long, value_name = "HEIGHT", default_value_t = 0)]
    start_after: u32,

    #[command(flatten)]
    history: MarketHistoryArgs,
}

/// One recorded block
#[derive(Debug, Deserialize)]
struct BlockRecord {
    block_num: u32,
    timestamp: BlockTime,
    #[serde(default)]
    operations: Vec<Operation>,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "market_history=info,market_history_replay=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();

    let base = match &cli.config {
        Some(path) => MarketHistoryConfig::from_file(path)?,
        None => MarketHistoryConfig::default(),
    };
    let config = cli.history.merge_into(base);

    let mut ledger = Ledger::resume_at(cli.start_after);
    let plugin = MarketHistoryPlugin::plugin_initialize(config, &mut ledger);

    let file = File::open(&cli.blocks)
        .with_context(|| format!("failed to open {}", cli.blocks.display()))?;

    let mut applied = 0u32;
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: BlockRecord = serde_json::from_str(&line)
            .with_context(|| format!("invalid block on line {}", line_no + 1))?;
        let block = SignedBlock {
            block_num: record.block_num,
            timestamp: record.timestamp,
        };
        ledger
            .apply_block(&block, record.operations)
            .with_context(|| format!("block {} rejected", block.block_num))?;

        applied += 1;
        if applied % PROGRESS_LOG_INTERVAL == 0 {
            info!("Replayed {} blocks", applied);
        }
    }

    let history = plugin.history();
    let history = history.read();
    let index = history.index();

    for (key, record) in index.iter() {
        println!("{key}  {record}");
    }
    println!();
    println!("Blocks replayed: {applied}");
    println!("Buckets: {}", index.len());
    println!("State checksum: 0x{:08X}", index.state_checksum()?);

    Ok(())
}
