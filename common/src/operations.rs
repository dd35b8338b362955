//! Ledger operations as reported in a block's applied-operation history

use crate::types::AssetAmount;
use serde::{Deserialize, Serialize};

/// Object id of an account
pub type AccountId = u64;

/// Object id of a limit order
pub type OrderId = u64;

/// Move funds between two accounts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Fee paid by `from`
    pub fee: AssetAmount,
    /// Sender
    pub from: AccountId,
    /// Receiver
    pub to: AccountId,
    /// Transferred amount
    pub amount: AssetAmount,
}

/// Place a limit order on the book
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrderCreate {
    /// Fee paid by the seller
    pub fee: AssetAmount,
    /// Account placing the order
    pub seller: AccountId,
    /// Amount offered
    pub amount_to_sell: AssetAmount,
    /// Minimum amount wanted in return
    pub min_to_receive: AssetAmount,
    /// Expiration in seconds since the epoch
    pub expiration: u32,
}

/// Remove a resting limit order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrderCancel {
    /// Fee paid by the owner
    pub fee: AssetAmount,
    /// Order being cancelled
    pub order: OrderId,
    /// Owner of the order
    pub fee_paying_account: AccountId,
}

/// One side of a matched trade.
///
/// The matching engine emits two of these per match, one per counterparty,
/// with `pays` and `receives` mirrored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillOrder {
    /// Order that was (partially) filled
    pub order_id: OrderId,
    /// Owner of the order
    pub account_id: AccountId,
    /// What this side gave up
    pub pays: AssetAmount,
    /// What this side got
    pub receives: AssetAmount,
    /// Market fee charged on `receives`
    pub fee: AssetAmount,
}

/// Register an account as a block-producing witness
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessCreate {
    /// Registration fee
    pub fee: AssetAmount,
    /// Account becoming a witness
    pub witness_account: AccountId,
    /// Hex-encoded block signing key
    pub block_signing_key: String,
}

/// Withdraw accumulated witness pay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WitnessWithdrawPay {
    /// Witness object id
    pub from_witness: u64,
    /// Account credited with the pay
    pub to_account: AccountId,
    /// Withdrawn amount
    pub amount: AssetAmount,
}

/// Closed set of operation kinds the ledger applies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Operation {
    /// Funds transfer
    Transfer(Transfer),
    /// Limit order placement
    LimitOrderCreate(LimitOrderCreate),
    /// Limit order cancellation
    LimitOrderCancel(LimitOrderCancel),
    /// Trade fill (virtual operation)
    FillOrder(FillOrder),
    /// Witness registration
    WitnessCreate(WitnessCreate),
    /// Witness pay withdrawal
    WitnessWithdrawPay(WitnessWithdrawPay),
}

impl Operation {
    /// Fill payload, if this is a trade fill
    #[must_use]
    pub const fn as_fill(&self) -> Option<&FillOrder> {
        match self {
            Self::FillOrder(fill) => Some(fill),
            _ => None,
        }
    }
}

/// An operation as applied within a block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationHistory {
    /// The applied operation
    pub op: Operation,
    /// Block the operation was applied in
    pub block_num: u32,
    /// Position of the enclosing transaction within the block
    pub trx_in_block: u16,
    /// Position of the operation within its transaction
    pub op_in_trx: u16,
}
