//! Autoconnect behaviour with a real tokio spawner.

mod common;

use common::*;
use std::sync::Arc;
use walletstore_core::{AdapterEvent, ConnectionState, Error, StoreOptions, WalletStore};

fn autoconnect_store(wallet: &MockWallet) -> WalletStore {
    WalletStore::new(
        StoreOptions::new(vec![wallet.descriptor()]).with_autoconnect(Arc::new(TokioSpawner)),
    )
    .unwrap()
}

#[tokio::test]
async fn test_connects_when_ready() {
    let phantom = phantom();
    let store = autoconnect_store(&phantom);
    assert!(store.is_autoconnect_enabled());

    store.select(Some("Phantom")).await.unwrap();
    settle().await;
    // Nothing happens until the wallet is ready
    assert_eq!(MockAdapter::calls(&phantom.adapter().connect_calls), 0);

    phantom.adapter().emit(AdapterEvent::Ready);
    settle().await;

    let snapshot = store.snapshot();
    assert_eq!(snapshot.state, ConnectionState::Connected);
    assert_eq!(snapshot.public_key, Some(key(1)));
    assert_eq!(MockAdapter::calls(&phantom.adapter().connect_calls), 1);
}

#[tokio::test]
async fn test_reconnects_after_disconnect() {
    let phantom = phantom();
    let store = autoconnect_store(&phantom);
    store.select(Some("Phantom")).await.unwrap();
    phantom.adapter().emit(AdapterEvent::Ready);
    settle().await;

    phantom.adapter().emit(AdapterEvent::Disconnect);
    settle().await;

    assert_eq!(store.state(), ConnectionState::Connected);
    assert_eq!(MockAdapter::calls(&phantom.adapter().connect_calls), 2);
}

#[tokio::test]
async fn test_teardown_stops_autoconnect() {
    let phantom = phantom();
    let store = autoconnect_store(&phantom);
    store.select(Some("Phantom")).await.unwrap();

    store.teardown().await.unwrap();
    assert!(!store.is_autoconnect_enabled());

    store.select(Some("Phantom")).await.unwrap();
    phantom.adapter().emit(AdapterEvent::Ready);
    settle().await;

    assert_eq!(store.state(), ConnectionState::Ready);
    assert_eq!(MockAdapter::calls(&phantom.adapter().connect_calls), 0);
}

#[tokio::test]
async fn test_autoconnect_requires_spawner() {
    let mut options = StoreOptions::new(vec![phantom().descriptor()]);
    options.autoconnect = true;

    assert!(matches!(WalletStore::new(options), Err(Error::Config(_))));
}
