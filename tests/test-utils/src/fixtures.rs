//! Test fixtures for common test data

use common::{AssetId, BlockTime, Ledger};
use rstest::*;

use crate::factories::{BlockFactory, FillFactory};

/// Core asset, lowest id
#[fixture]
pub fn core_asset() -> AssetId {
    AssetId::new(0)
}

/// Asset `A` of the reference scenarios
#[fixture]
pub fn asset_a() -> AssetId {
    AssetId::new(1)
}

/// Asset `B` of the reference scenarios, `A < B`
#[fixture]
pub fn asset_b() -> AssetId {
    AssetId::new(2)
}

#[fixture]
pub fn genesis_time() -> BlockTime {
    BlockTime::EPOCH
}

#[fixture]
pub fn ledger() -> Ledger {
    Ledger::new()
}

#[fixture]
pub fn fills() -> FillFactory {
    FillFactory::new()
}

/// Seeded block stream over three assets
#[fixture]
pub fn block_factory() -> BlockFactory {
    BlockFactory::seeded(42)
}
