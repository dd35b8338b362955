//! Ledger value types, operations, and the applied-block notification surface

#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod ledger;
pub mod operations;
pub mod types;

pub use ledger::{
    AppliedBlockObserver, AppliedBlockSource, AppliedOperations, Ledger, LedgerError,
    SignedBlock,
};
pub use operations::{
    AccountId, FillOrder, LimitOrderCancel, LimitOrderCreate, Operation, OperationHistory,
    OrderId, Transfer, WitnessCreate, WitnessWithdrawPay,
};
pub use types::*;
