//! JavaScript storage adapters for WASM.
//!
//! This module provides the bridge between browser storage and the core
//! `PreferenceStorage` trait: either `window.localStorage` directly, or
//! TypeScript callbacks for hosts that keep preferences elsewhere.

use js_sys::{Function, Promise};
use walletstore_core::Error;
use walletstore_core::storage::{PreferenceStorage, StorageFuture};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

/// `PreferenceStorage` backed by `window.localStorage`.
pub struct BrowserLocalStorage {
    storage: web_sys::Storage,
}

impl BrowserLocalStorage {
    /// Grab `window.localStorage`.
    ///
    /// Returns `None` outside a browser window or when storage access is
    /// blocked (private mode, sandboxed iframes); the store then skips
    /// persistence.
    pub fn detect() -> Option<Self> {
        let window = web_sys::window()?;
        match window.local_storage() {
            Ok(Some(storage)) => Some(Self { storage }),
            Ok(None) => None,
            Err(e) => {
                log::warn!("localStorage is not accessible: {:?}", e);
                None
            }
        }
    }
}

impl PreferenceStorage for BrowserLocalStorage {
    fn get(&self, key: &str) -> StorageFuture<'_, Option<String>> {
        let result = self
            .storage
            .get_item(key)
            .map_err(|e| Error::Storage(format!("localStorage.getItem failed: {:?}", e)));
        Box::pin(async move { result })
    }

    fn set(&self, key: &str, value: &str) -> StorageFuture<'_, ()> {
        let result = self
            .storage
            .set_item(key, value)
            .map_err(|e| Error::Storage(format!("localStorage.setItem failed: {:?}", e)));
        Box::pin(async move { result })
    }
}

/// JavaScript preference storage provider passed from TypeScript.
///
/// This struct wraps JavaScript callback functions that implement
/// the preference storage operations. Each function should return a Promise.
///
/// # Example (TypeScript)
///
/// ```typescript
/// const provider = new JsPreferenceStorageProvider(
///     async (key) => sessionStorage.getItem(key),               // get
///     async (key, value) => sessionStorage.setItem(key, value), // set
/// );
/// const store = WalletStore.withStorage(wallets, {}, provider);
/// ```
#[wasm_bindgen]
pub struct JsPreferenceStorageProvider {
    get_fn: Function,
    set_fn: Function,
}

#[wasm_bindgen]
impl JsPreferenceStorageProvider {
    /// Create a new JsPreferenceStorageProvider from JavaScript callbacks.
    ///
    /// # Arguments
    /// * `get_fn` - Function: `(key: string) => Promise<string | null>`
    /// * `set_fn` - Function: `(key: string, value: string) => Promise<void>`
    #[wasm_bindgen(constructor)]
    pub fn new(get_fn: Function, set_fn: Function) -> Self {
        Self { get_fn, set_fn }
    }
}

/// Internal adapter that implements the core PreferenceStorage trait using JS callbacks.
pub struct JsPreferenceStorageAdapter {
    provider: JsPreferenceStorageProvider,
}

impl JsPreferenceStorageAdapter {
    pub fn new(provider: JsPreferenceStorageProvider) -> Self {
        Self { provider }
    }
}

impl PreferenceStorage for JsPreferenceStorageAdapter {
    fn get(&self, key: &str) -> StorageFuture<'_, Option<String>> {
        let key = JsValue::from_str(key);
        let result = self.provider.get_fn.call1(&JsValue::NULL, &key);

        Box::pin(async move {
            let promise: Promise = result
                .map_err(|e| Error::Storage(format!("Failed to call get: {:?}", e)))?
                .dyn_into()
                .map_err(|_| Error::Storage("Expected Promise from get".into()))?;

            let value = JsFuture::from(promise)
                .await
                .map_err(|e| Error::Storage(format!("get Promise rejected: {:?}", e)))?;

            if value.is_null() || value.is_undefined() {
                Ok(None)
            } else {
                Ok(value.as_string())
            }
        })
    }

    fn set(&self, key: &str, value: &str) -> StorageFuture<'_, ()> {
        let key = JsValue::from_str(key);
        let value = JsValue::from_str(value);
        let result = self.provider.set_fn.call2(&JsValue::NULL, &key, &value);

        Box::pin(async move {
            let promise: Promise = result
                .map_err(|e| Error::Storage(format!("Failed to call set: {:?}", e)))?
                .dyn_into()
                .map_err(|_| Error::Storage("Expected Promise from set".into()))?;

            JsFuture::from(promise)
                .await
                .map_err(|e| Error::Storage(format!("set Promise rejected: {:?}", e)))?;

            Ok(())
        })
    }
}
