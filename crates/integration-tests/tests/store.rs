//! Integration tests for snapshot persistence.

#![allow(clippy::expect_used, clippy::indexing_slicing)]

use chrono::{TimeZone, Utc};
use neupool_app::{AppContext, AppError, StateStore, StoreError, seed_state};
use neupool_core::{
    ChemicalAdjustment, ChemicalReading, CommitRequest, NewInventoryItem, PoolId, UserId,
    WaterEvents, commit_log,
};
use neupool_integration_tests::{TempDataDir, qty, reading};

// =============================================================================
// Load
// =============================================================================

#[tokio::test]
async fn test_missing_snapshot_loads_seed_state() {
    let dir = TempDataDir::new();
    let store = StateStore::from_config(&dir.config());

    assert!(store.load_existing().await.expect("load").is_none());

    let state = store.load().await.expect("load");
    assert_eq!(state.users.len(), 2);
    assert_eq!(state.pools.len(), 2);
    assert!(state.inventory.is_empty());
    assert!(state.logs.is_empty());
}

#[tokio::test]
async fn test_corrupt_snapshot_is_reported() {
    let dir = TempDataDir::new();
    let config = dir.config();
    std::fs::create_dir_all(dir.path()).expect("mkdir");
    std::fs::write(config.state_path(), "{ not json").expect("write");

    let store = StateStore::from_config(&config);
    assert!(matches!(
        store.load().await,
        Err(StoreError::Corrupt { .. })
    ));
    assert!(matches!(
        AppContext::load(config).await,
        Err(AppError::Store(StoreError::Corrupt { .. }))
    ));
}

// =============================================================================
// Save
// =============================================================================

#[tokio::test]
async fn test_round_trip_preserves_state() {
    let dir = TempDataDir::new();
    let store = StateStore::from_config(&dir.config());

    let now = Utc.with_ymd_and_hms(2026, 6, 1, 9, 30, 0).single().expect("time");
    let state = seed_state().expect("seed");
    let (state, _) = state
        .add_inventory_item(
            NewInventoryItem {
                name: "Muriatic Acid".to_string(),
                quantity: qty("2.5"),
                unit: Some("gal".to_string()),
                vendor: Some("Pool Supply Co".to_string()),
                vendor_url: None,
                min_threshold: Some(qty("1")),
            },
            now,
        )
        .expect("add item");

    // Calcium, salt and temperature absent; notes absent.
    let readings = ChemicalReading {
        calcium_hardness: None,
        ..reading(7.8)
    };
    let commit = commit_log(
        &state,
        CommitRequest {
            pool_id: PoolId::new("pool-1"),
            user_id: Some(UserId::new("2")),
            readings,
            adjustments: vec![ChemicalAdjustment::recommended(
                "Muriatic Acid",
                qty("0.5"),
                "gal",
                "pH high",
            )],
            water_events: WaterEvents::new(false, false, true),
            notes: None,
        },
        now,
    )
    .expect("commit");

    store.save(&commit.state).await.expect("save");
    let loaded = store.load().await.expect("load");

    assert_eq!(loaded, commit.state);
    assert_eq!(loaded.logs[0].readings.calcium_hardness, None);
    assert_eq!(loaded.logs[0].notes, None);
    assert!(loaded.logs[0].water_events.drained);
    assert_eq!(loaded.inventory[0].quantity, qty("2"));
}

#[tokio::test]
async fn test_high_precision_quantity_survives_reload() {
    let dir = TempDataDir::new();
    let store = StateStore::from_config(&dir.config());

    let precise = qty("0.12345678901234567891");
    let (state, item_id) = seed_state()
        .expect("seed")
        .add_inventory_item(
            NewInventoryItem {
                name: "Cyanuric Acid".to_string(),
                quantity: precise,
                unit: Some("lbs".to_string()),
                vendor: None,
                vendor_url: None,
                min_threshold: None,
            },
            Utc::now(),
        )
        .expect("add item");

    store.save(&state).await.expect("save");
    let raw = std::fs::read_to_string(store.path()).expect("read snapshot");
    assert!(raw.contains("\"0.12345678901234567891\""));

    let loaded = store.load().await.expect("load");
    let item = loaded
        .inventory
        .iter()
        .find(|item| item.id == item_id)
        .expect("item");
    assert_eq!(item.quantity, precise);
    assert_eq!(loaded, state);
}

#[tokio::test]
async fn test_save_leaves_no_temp_file() {
    let dir = TempDataDir::new();
    let store = StateStore::from_config(&dir.config());

    store.save(&seed_state().expect("seed")).await.expect("save");
    store.save(&seed_state().expect("seed")).await.expect("save again");

    assert!(store.path().exists());
    let entries: Vec<_> = std::fs::read_dir(dir.path())
        .expect("read dir")
        .filter_map(Result::ok)
        .collect();
    assert_eq!(entries.len(), 1);
}

#[tokio::test]
async fn test_context_apply_persists() {
    let dir = TempDataDir::new();
    let mut ctx = AppContext::load(dir.config()).await.expect("load");

    let next = ctx
        .state()
        .delete_pool(&PoolId::new("pool-2"))
        .expect("delete");
    ctx.apply(next).await.expect("apply");

    let reloaded = AppContext::load(dir.config()).await.expect("reload");
    assert_eq!(reloaded.state(), ctx.state());
    assert!(reloaded.state().pool(&PoolId::new("pool-2")).is_none());
}
