//! Store operations against a live realtime database.
//!
//! These tests require:
//! - `COSTEO_TEST_DATABASE_URL` pointing at a database that allows writes
//! - `COSTEO_AUTH_TOKEN` if its rules require auth
//!
//! Everything is written under `costeo-it/<uuid>` and removed afterwards.
//!
//! Run with: cargo test -p costeo-integration-tests -- --ignored

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use costeo_core::{LaborRole, LaborRoleId};
use costeo_integration_tests::realtime_test_url;
use costeo_store::{Backend, RealtimeDb, Store, StoreConfig};
use rust_decimal_macros::dec;
use uuid::Uuid;

fn live_store() -> Store<RealtimeDb> {
    let url = realtime_test_url().expect("COSTEO_TEST_DATABASE_URL not set");
    let root = format!("costeo-it/{}", Uuid::new_v4().simple());
    let token = std::env::var("COSTEO_AUTH_TOKEN").ok();

    let config = StoreConfig::from_lookup(|key| match key {
        "COSTEO_DATABASE_URL" => Some(url.clone()),
        "COSTEO_ROOT_PATH" => Some(root.clone()),
        "COSTEO_AUTH_TOKEN" => token.clone(),
        "COSTEO_POLL_INTERVAL_SECS" => Some("1".to_string()),
        _ => None,
    })
    .unwrap();
    Store::new(RealtimeDb::new(&config).unwrap())
}

#[tokio::test]
#[ignore = "Requires a realtime database (COSTEO_TEST_DATABASE_URL)"]
async fn test_labor_role_lifecycle() {
    let store = live_store();
    store.ready().await.unwrap();

    let id = store
        .labor_roles
        .create(&LaborRole::new("", "Panadero", dec!(20)))
        .await
        .unwrap();
    let role_id = LaborRoleId::new(id.clone());

    let fetched = store.labor_roles.get_by_id(&role_id).await.unwrap().unwrap();
    assert_eq!(fetched.name, "Panadero");
    assert_eq!(fetched.hourly_cost, dec!(20));

    store
        .labor_roles
        .update(&id, &LaborRole::new("", "Panadero", dec!(22.5)))
        .await
        .unwrap();
    let snapshot = store.load_snapshot().await.unwrap();
    assert_eq!(snapshot.labor_roles[&role_id].hourly_cost, dec!(22.5));

    store.labor_roles.delete(&id).await.unwrap();
    assert!(store.labor_roles.get_by_id(&role_id).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "Requires a realtime database (COSTEO_TEST_DATABASE_URL)"]
async fn test_polling_watch_sees_remote_write() {
    let store = live_store();
    store.ready().await.unwrap();

    let mut receiver = store.backend().watch("laborRoles").await.unwrap();
    let id = store
        .labor_roles
        .create(&LaborRole::new("", "Pastelero", dec!(25)))
        .await
        .unwrap();

    tokio::time::timeout(Duration::from_secs(10), receiver.changed())
        .await
        .unwrap()
        .unwrap();
    assert!(receiver.borrow().get(&id).is_some());

    store.labor_roles.delete(&id).await.unwrap();
}
