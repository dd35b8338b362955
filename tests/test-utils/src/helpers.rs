//! Test helper functions and utilities

use common::{BlockTime, Operation, OperationHistory, SignedBlock};
use tracing_subscriber::EnvFilter;

/// Initialize test logging with environment-based configuration.
///
/// Safe to call multiple times - subsequent calls are ignored.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Block header at `secs`
pub fn block_at(block_num: u32, secs: u32) -> SignedBlock {
    SignedBlock {
        block_num,
        timestamp: BlockTime::from_secs(secs),
    }
}

/// Flatten mirrored fill pairs into one block's operation list
pub fn flatten<const N: usize>(pairs: impl IntoIterator<Item = [Operation; N]>) -> Vec<Operation> {
    pairs.into_iter().flatten().collect()
}

/// Wrap operations the way the ledger reports them for `block_num`
pub fn as_history(block_num: u32, operations: Vec<Operation>) -> Vec<OperationHistory> {
    operations
        .into_iter()
        .enumerate()
        .map(|(i, op)| OperationHistory {
            op,
            block_num,
            trx_in_block: u16::try_from(i).unwrap_or(u16::MAX),
            op_in_trx: 0,
        })
        .collect()
}
