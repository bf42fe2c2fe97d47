//! Browser tests for the JavaScript bridge.
//!
//! Run with: wasm-pack test --headless --firefox wasm-sdk

#![cfg(target_arch = "wasm32")]

use js_sys::{Array, Function, Object, Promise, Reflect};
use walletstore_core::WalletAdapter;
use walletstore_wasm_sdk::{
    ConnectionState, JsPreferenceStorageProvider, JsWalletAdapter, WalletStore,
};
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn adapter_object(methods: &[&str]) -> JsValue {
    let object = Object::new();
    let resolved = Function::new_no_args("return Promise.resolve();");
    for method in methods {
        Reflect::set(&object, &JsValue::from_str(method), &resolved).unwrap();
    }
    object.into()
}

fn base_methods() -> Vec<&'static str> {
    vec!["connect", "disconnect", "on", "off", "sendTransaction"]
}

#[wasm_bindgen_test]
fn detects_optional_signing_methods() {
    let mut methods = base_methods();
    methods.push("signTransaction");
    let adapter = JsWalletAdapter::new(adapter_object(&methods));

    let capabilities = adapter.capabilities();
    assert!(capabilities.sign_transaction);
    assert!(!capabilities.sign_all_transactions);
    assert!(!capabilities.sign_message);
    assert!(adapter.as_sign_message().is_none());
}

#[wasm_bindgen_test]
fn public_key_read_from_string_property() {
    let object = adapter_object(&base_methods());
    Reflect::set(
        &object,
        &JsValue::from_str("publicKey"),
        &JsValue::from_str("11111111111111111111111111111111"),
    )
    .unwrap();

    let adapter = JsWalletAdapter::new(object);
    assert_eq!(adapter.public_key().map(|k| k.to_bytes()), Some([0u8; 32]));
}

fn phantom_wallet() -> Object {
    let wallet = Object::new();
    Reflect::set(&wallet, &"name".into(), &"Phantom".into()).unwrap();
    Reflect::set(&wallet, &"url".into(), &"https://phantom.app".into()).unwrap();
    Reflect::set(&wallet, &"adapter".into(), &adapter_object(&base_methods())).unwrap();
    wallet
}

/// Yield to the microtask queue a few times.
async fn tick() {
    for _ in 0..50 {
        JsFuture::from(Promise::resolve(&JsValue::UNDEFINED))
            .await
            .unwrap();
    }
}

#[wasm_bindgen_test]
async fn select_wraps_js_adapter() {
    let wallet = phantom_wallet();

    let store = WalletStore::new(Array::of1(&wallet), JsValue::UNDEFINED).unwrap();
    store.select(Some("Phantom".to_string())).await.unwrap();

    let snapshot = store.snapshot();
    assert_eq!(snapshot.wallet_name.as_deref(), Some("Phantom"));
    assert_eq!(snapshot.state, ConnectionState::NotReady);
    assert_eq!(snapshot.state_label, "Initializing");
    assert!(!snapshot.can_sign_message);

    store.teardown().await.unwrap();
}

#[wasm_bindgen_test]
async fn constructor_resumes_saved_wallet() {
    let storage = JsPreferenceStorageProvider::new(
        Function::new_with_args("key", "return Promise.resolve('Phantom');"),
        Function::new_with_args("key, value", "return Promise.resolve();"),
    );
    let store =
        WalletStore::with_storage(Array::of1(&phantom_wallet()), JsValue::UNDEFINED, storage)
            .unwrap();

    tick().await;
    assert_eq!(store.snapshot().wallet_name.as_deref(), Some("Phantom"));

    store.teardown().await.unwrap();
}

#[wasm_bindgen_test]
fn rejects_wallet_without_adapter() {
    let wallet = Object::new();
    Reflect::set(&wallet, &"name".into(), &"Phantom".into()).unwrap();
    Reflect::set(&wallet, &"url".into(), &"https://phantom.app".into()).unwrap();

    assert!(WalletStore::new(Array::of1(&wallet), JsValue::UNDEFINED).is_err());
}
