//! Applied-block notification surface of the ledger
//!
//! Plugins never drive the ledger; they register an observer that the ledger
//! calls synchronously after each block's operations are applied, before the
//! next block may start. [`Ledger`] is an in-memory implementation of that
//! surface used by tools and tests.

use crate::operations::{Operation, OperationHistory};
use crate::types::BlockTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error};

/// Header fields of an applied block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedBlock {
    /// Height of the block
    pub block_num: u32,
    /// Production time of the block
    pub timestamp: BlockTime,
}

/// Read access to the operations applied by the block being processed
pub trait AppliedOperations {
    /// Operations in application order
    fn applied_operations(&self) -> &[OperationHistory];
}

/// Observer invoked once per applied block
pub type AppliedBlockObserver =
    Box<dyn FnMut(&SignedBlock, &dyn AppliedOperations) -> anyhow::Result<()> + Send>;

/// Something that announces applied blocks
pub trait AppliedBlockSource {
    /// Register an observer; observers run in registration order
    fn on_applied_block(&mut self, observer: AppliedBlockObserver);
}

/// Ledger-side failures
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Blocks must be applied in height order
    #[error("block {got} does not follow head block {head}")]
    OutOfOrder {
        /// Height of the last applied block
        head: u32,
        /// Height that was offered
        got: u32,
    },

    /// An observer rejected the block
    #[error("applied-block observer failed at block {block_num}: {source}")]
    ObserverFailed {
        /// Height of the rejected block
        block_num: u32,
        /// Observer error
        #[source]
        source: anyhow::Error,
    },
}

/// Minimal ledger that records applied operations and notifies observers
#[derive(Default)]
pub struct Ledger {
    head_block_num: u32,
    applied_operations: Vec<OperationHistory>,
    observers: Vec<AppliedBlockObserver>,
}

impl Ledger {
    /// Empty ledger at height zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty ledger whose next block is `head_block_num + 1`, for replaying a
    /// chain segment
    #[must_use]
    pub fn resume_at(head_block_num: u32) -> Self {
        Self {
            head_block_num,
            ..Self::default()
        }
    }

    /// Height of the last applied block
    #[must_use]
    pub const fn head_block_num(&self) -> u32 {
        self.head_block_num
    }

    /// Apply a block's operations and notify every observer.
    ///
    /// Each operation is treated as its own transaction. If an observer
    /// fails the head does not advance and the error is returned.
    pub fn apply_block(
        &mut self,
        block: &SignedBlock,
        operations: Vec<Operation>,
    ) -> Result<(), LedgerError> {
        if self.head_block_num.checked_add(1) != Some(block.block_num) {
            return Err(LedgerError::OutOfOrder {
                head: self.head_block_num,
                got: block.block_num,
            });
        }

        self.applied_operations = operations
            .into_iter()
            .enumerate()
            .map(|(i, op)| OperationHistory {
                op,
                block_num: block.block_num,
                trx_in_block: u16::try_from(i).unwrap_or(u16::MAX),
                op_in_trx: 0,
            })
            .collect();

        debug!(
            "Applied block {} at {} with {} operations",
            block.block_num,
            block.timestamp,
            self.applied_operations.len()
        );

        // Observers borrow the ledger as the operation accessor while running
        let mut observers = std::mem::take(&mut self.observers);
        let outcome = observers
            .iter_mut()
            .try_for_each(|observer| observer(block, &*self));
        self.observers = observers;

        if let Err(source) = outcome {
            error!("Block {} rejected by observer: {:#}", block.block_num, source);
            return Err(LedgerError::ObserverFailed {
                block_num: block.block_num,
                source,
            });
        }

        self.head_block_num = block.block_num;
        Ok(())
    }
}

impl AppliedOperations for Ledger {
    fn applied_operations(&self) -> &[OperationHistory] {
        &self.applied_operations
    }
}

impl AppliedBlockSource for Ledger {
    fn on_applied_block(&mut self, observer: AppliedBlockObserver) {
        self.observers.push(observer);
    }
}
