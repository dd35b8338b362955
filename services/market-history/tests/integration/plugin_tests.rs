//! End-to-end tests driving the plugin through a ledger

use anyhow::Result;
use common::{AssetAmount, AssetId, FillOrder, Ledger, LedgerError, Operation};
use market_history::{MarketHistoryConfig, MarketHistoryError, MarketHistoryPlugin};
use pretty_assertions::assert_eq;
use rstest::*;
use std::collections::BTreeSet;
use std::num::NonZeroU32;
use test_utils::{
    FillFactory, asset_a, asset_b, block_at, fills, flatten, init_test_logging, ledger,
};

fn minute() -> NonZeroU32 {
    NonZeroU32::new(60).expect("non-zero")
}

fn windows(plugin: &MarketHistoryPlugin, base: AssetId, quote: AssetId) -> Vec<u32> {
    plugin
        .snapshot_series(base, quote, 60)
        .iter()
        .map(|(key, _)| key.window_open().as_secs())
        .collect()
}

#[fixture]
fn config() -> MarketHistoryConfig {
    MarketHistoryConfig::with_bucket_sizes([minute()]).history_per_size(2)
}

#[rstest]
fn test_plugin_surface(mut ledger: Ledger, config: MarketHistoryConfig) {
    let plugin = MarketHistoryPlugin::plugin_initialize(config, &mut ledger);

    assert_eq!(plugin.plugin_name(), "market_history");
    assert_eq!(plugin.tracked_buckets(), BTreeSet::from([minute()]));
    assert_eq!(plugin.max_history(), 2);
}

#[rstest]
fn test_scenario_through_ledger(
    mut ledger: Ledger,
    config: MarketHistoryConfig,
    mut fills: FillFactory,
    asset_a: AssetId,
    asset_b: AssetId,
) -> Result<()> {
    init_test_logging();
    let plugin = MarketHistoryPlugin::plugin_initialize(config, &mut ledger);

    for (block_num, secs) in [(1, 0), (2, 61), (3, 181)] {
        let ops = flatten([fills.matched(
            AssetAmount::new(100, asset_a),
            AssetAmount::new(10, asset_b),
        )]);
        ledger.apply_block(&block_at(block_num, secs), ops)?;
    }

    assert_eq!(ledger.head_block_num(), 3);
    assert_eq!(windows(&plugin, asset_a, asset_b), vec![60, 180]);
    assert!(plugin.snapshot_series(asset_b, asset_a, 60).is_empty());
    assert!(plugin.snapshot_series(asset_a, asset_b, 0).is_empty());
    Ok(())
}

#[rstest]
fn test_engine_failure_rejects_block(
    mut ledger: Ledger,
    config: MarketHistoryConfig,
    mut fills: FillFactory,
    asset_a: AssetId,
    asset_b: AssetId,
) -> Result<()> {
    let plugin = MarketHistoryPlugin::plugin_initialize(config, &mut ledger);
    let ops = flatten([fills.matched(
        AssetAmount::new(100, asset_a),
        AssetAmount::new(10, asset_b),
    )]);
    ledger.apply_block(&block_at(1, 0), ops)?;
    let before = plugin.history().read().index().state_checksum()?;

    let mut ops = flatten([fills.matched(

        AssetAmount::new(5, asset_a),

        AssetAmount::new(1, asset_b),

    )]);
    ops.push(Operation::FillOrder(FillOrder {
        order_id: 7,
        account_id: 1,
        pays: AssetAmount::new(3, asset_b),
        receives: AssetAmount::new(3, asset_b),
        fee: AssetAmount::new(0, asset_b),
    }));

    let err = ledger.apply_block(&block_at(2, 61), ops).expect_err("malformed fill");
    match err {
        LedgerError::ObserverFailed { block_num, source } => {
            assert_eq!(block_num, 2);
            assert!(matches!(
                source.downcast_ref::<MarketHistoryError>(),
                Some(MarketHistoryError::MalformedFill { op_index: 2, .. })
            ));
        }
        other => panic!("expected observer failure, got {other:?}"),
    }

    assert_eq!(ledger.head_block_num(), 1);
    assert_eq!(plugin.history().read().index().state_checksum()?, before);
    assert_eq!(windows(&plugin, asset_a, asset_b), vec![0]);

    // the same height can be retried once the bad fill is gone
    let ops = flatten([fills.matched(AssetAmount::new(5, asset_a), AssetAmount::new(1, asset_b))]);
    ledger.apply_block(&block_at(2, 61), ops)?;
    assert_eq!(windows(&plugin, asset_a, asset_b), vec![0, 60]);
    Ok(())
}

#[rstest]
fn test_disabled_plugin_observes_nothing(
    mut ledger: Ledger,
    mut fills: FillFactory,
    asset_a: AssetId,
    asset_b: AssetId,
) -> Result<()> {
    let plugin =
        MarketHistoryPlugin::plugin_initialize(MarketHistoryConfig::default(), &mut ledger);

    let ops = flatten([fills.matched(

        AssetAmount::new(100, asset_a),

        AssetAmount::new(10, asset_b),

    )]);
    ledger.apply_block(&block_at(1, 0), ops)?;

    assert_eq!(ledger.head_block_num(), 1);
    assert!(plugin.history().read().index().is_empty());
    Ok(())
}

#[rstest]
fn test_handle_is_shared(
    mut ledger: Ledger,
    config: MarketHistoryConfig,
    mut fills: FillFactory,
    asset_a: AssetId,
    asset_b: AssetId,
) -> Result<()> {
    let plugin = MarketHistoryPlugin::plugin_initialize(config, &mut ledger);
    let handle = plugin.history();
    assert!(handle.read().index().is_empty());

    let ops = flatten([fills.matched(

        AssetAmount::new(100, asset_a),

        AssetAmount::new(10, asset_b),

    )]);
    ledger.apply_block(&block_at(1, 30), ops)?;
    let reader = std::thread::spawn(move || handle.read().index().len());
    let seen = reader.join().map_err(|_| anyhow::anyhow!("reader thread panicked"))?;
    assert_eq!(seen, 1);
    Ok(())
}
