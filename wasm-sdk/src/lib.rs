//! Wallet Store SDK - WASM Bindings
//!
//! This crate provides WebAssembly bindings for the Wallet Store SDK.
//! It wraps the core library with WASM-compatible types and JavaScript interop:
//! JavaScript wallet adapters are bridged into the core adapter trait and the
//! selected wallet is remembered in `localStorage`.
//!
//! **Note:** This crate is WASM-only and will not compile for native targets.
//!
//! # Usage from JavaScript/TypeScript
//!
//! ```javascript
//! import init, { WalletStore } from '@walletstore/sdk';
//!
//! // Initialize WASM
//! await init();
//!
//! const store = new WalletStore(
//!     [{ name: 'Phantom', url: 'https://phantom.app', adapter: () => new PhantomWalletAdapter() }],
//!     { autoconnect: true },
//! );
//!
//! // The wallet picked in a previous session is restored automatically
//!
//! store.subscribe((snapshot) => console.log(snapshot.stateLabel, snapshot.publicKey));
//! await store.select('Phantom');
//! await store.connect();
//! ```

// This crate only compiles for WASM targets
#![cfg(target_arch = "wasm32")]

mod client;
mod error;
mod js_adapter;
mod js_types;
mod storage_adapter;

use serde::Serialize;
use wasm_bindgen::prelude::*;

pub use client::*;
pub use error::*;
pub use js_adapter::{JsWalletAdapter, LocalSpawner, WindowUrlOpener};
pub use js_types::*;
pub use storage_adapter::*;

/// Initialize the WASM module.
///
/// This sets up logging and panic hooks for better debugging.
#[wasm_bindgen(start)]
pub fn initialize() {
    // Set up panic hook for better error messages
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    // Initialize logging
    console_log::init_with_level(log::Level::Debug).ok();
    log::info!("Wallet Store SDK initialized");
}

/// Serialize a value to JsValue as a plain object (not a Map).
fn to_js_value<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::new().serialize_maps_as_objects(true);
    value
        .serialize(&serializer)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

/// Package version of the SDK.
#[wasm_bindgen(js_name = "version")]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
