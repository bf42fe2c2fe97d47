use crate::JsPreferenceStorageAdapter;
use crate::JsPreferenceStorageProvider;
use crate::WalletSnapshot;
use crate::js_adapter::{JsWalletAdapter, LocalSpawner, WindowUrlOpener};
use crate::map_err_to_js;
use crate::storage_adapter::BrowserLocalStorage;
use crate::{to_js_error, to_js_value};
use js_sys::{Array, Function, Reflect, Uint8Array};
use serde::Deserialize;
use std::sync::Arc;
use walletstore_core as wallet_core;
use walletstore_core::{
    Commitment, Connection, PreferenceStorage, SendTransactionOptions, StoreOptions, Transaction,
    WalletAdapter, WalletDescriptor, WalletInfo,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::wasm_bindgen;

/// Plain-data part of the store options object.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JsStoreOptions {
    persistence_key: Option<String>,
    #[serde(default)]
    autoconnect: bool,
}

fn get_string(object: &JsValue, field: &str) -> Result<Option<String>, JsValue> {
    let value = Reflect::get(object, &JsValue::from_str(field))?;
    if value.is_undefined() || value.is_null() {
        return Ok(None);
    }
    value
        .as_string()
        .map(Some)
        .ok_or_else(|| JsValue::from_str(&format!("Wallet field {field} must be a string")))
}

/// Build a descriptor from `{ name, url, icon?, adapter }`.
///
/// `adapter` is either a factory function returning a fresh adapter object,
/// or the adapter object itself.
fn descriptor_from_js(value: &JsValue) -> Result<WalletDescriptor, JsValue> {
    let name = get_string(value, "name")?.ok_or_else(|| JsValue::from_str("Wallet needs a name"))?;
    let url = get_string(value, "url")?
        .ok_or_else(|| JsValue::from_str(&format!("Wallet {name} needs a url")))?;
    let icon = get_string(value, "icon")?;
    let adapter = Reflect::get(value, &JsValue::from_str("adapter"))?;
    if adapter.is_undefined() || adapter.is_null() {
        return Err(JsValue::from_str(&format!("Wallet {name} needs an adapter")));
    }

    let wallet_name = name.clone();
    let descriptor = WalletDescriptor::new(name, url, move || -> Arc<dyn WalletAdapter> {
        let object = match adapter.dyn_ref::<Function>() {
            Some(factory) => factory.call0(&JsValue::NULL).unwrap_or_else(|e| {
                log::error!("Adapter factory for {wallet_name} threw: {:?}", e);
                JsValue::UNDEFINED
            }),
            None => adapter.clone(),
        };
        Arc::new(JsWalletAdapter::new(object))
    });

    Ok(match icon {
        Some(icon) => descriptor.with_icon(icon),
        None => descriptor,
    })
}

fn store_options(
    wallets: Array,
    options: JsValue,
    storage: Option<Arc<dyn PreferenceStorage>>,
) -> Result<StoreOptions, JsValue> {
    let descriptors = wallets
        .iter()
        .map(|wallet| descriptor_from_js(&wallet))
        .collect::<Result<Vec<_>, _>>()?;

    let parsed: JsStoreOptions = if options.is_undefined() || options.is_null() {
        JsStoreOptions::default()
    } else {
        map_err_to_js!(serde_wasm_bindgen::from_value(options.clone()))?
    };

    let mut store_options =
        StoreOptions::new(descriptors).with_url_opener(Arc::new(WindowUrlOpener));
    if let Some(key) = parsed.persistence_key {
        store_options = store_options.with_persistence_key(key);
    }
    if let Some(storage) = storage {
        store_options = store_options.with_storage(storage);
    }
    if parsed.autoconnect {
        store_options = store_options.with_autoconnect(Arc::new(LocalSpawner));
    }

    if !(options.is_undefined() || options.is_null()) {
        let on_error = Reflect::get(&options, &JsValue::from_str("onError"))?;
        if let Some(on_error) = on_error.dyn_ref::<Function>() {
            let on_error = on_error.clone();
            store_options = store_options.with_error_handler(move |err: &wallet_core::Error| {
                if let Err(e) = on_error.call1(&JsValue::NULL, &to_js_error(err)) {
                    log::error!("onError handler threw: {:?}", e);
                }
            });
        }
    }

    Ok(store_options)
}

/// Wallet store.
///
/// Construction resumes the wallet saved by a previous session on the next
/// microtask. Await [`init`](WalletStore::init) to know when that finished.
///
/// # Example (TypeScript)
///
/// ```typescript
/// const store = new WalletStore(
///     [
///         { name: 'Phantom', url: 'https://phantom.app', adapter: () => new PhantomWalletAdapter() },
///         { name: 'Solflare', url: 'https://solflare.com', adapter: () => new SolflareWalletAdapter() },
///     ],
///     { autoconnect: true, onError: (e) => console.error(e) },
/// );
/// const sub = store.subscribe((snapshot) => render(snapshot));
/// await store.select('Phantom');
/// ```
#[wasm_bindgen]
pub struct WalletStore {
    inner: wallet_core::WalletStore,
}

impl WalletStore {
    /// Create the store and start restoring the saved selection in the background.
    fn build(options: StoreOptions) -> Result<WalletStore, JsValue> {
        let inner = map_err_to_js!(wallet_core::WalletStore::new(options))?;
        let restoring = inner.clone();
        wasm_bindgen_futures::spawn_local(async move {
            restoring.init().await;
        });
        Ok(WalletStore { inner })
    }
}

#[wasm_bindgen]
impl WalletStore {
    /// Create a store persisting the selection in `localStorage`.
    ///
    /// # Arguments
    /// * `wallets` - Array of `{ name, url, icon?, adapter }`
    /// * `options` - `{ persistenceKey?, autoconnect?, onError? }`
    #[wasm_bindgen(constructor)]
    pub fn new(wallets: Array, options: JsValue) -> Result<WalletStore, JsValue> {
        let storage = BrowserLocalStorage::detect()
            .map(|storage| Arc::new(storage) as Arc<dyn PreferenceStorage>);
        if storage.is_none() {
            log::info!("localStorage unavailable, wallet selection will not be remembered");
        }
        Self::build(store_options(wallets, options, storage)?)
    }

    /// Create a store persisting the selection through custom callbacks.
    #[wasm_bindgen(js_name = "withStorage")]
    pub fn with_storage(
        wallets: Array,
        options: JsValue,
        storage: JsPreferenceStorageProvider,
    ) -> Result<WalletStore, JsValue> {
        let storage: Arc<dyn PreferenceStorage> =
            Arc::new(JsPreferenceStorageAdapter::new(storage));
        Self::build(store_options(wallets, options, Some(storage))?)
    }

    /// Restore the previously selected wallet. Resolves to its name, if any.
    ///
    /// The constructor already starts this; calling it again is harmless.
    pub async fn init(&self) -> Option<String> {
        self.inner.init().await
    }

    /// Select a wallet by name; `null` deselects.
    pub async fn select(&self, name: Option<String>) -> Result<(), JsValue> {
        map_err_to_js!(self.inner.select(name.as_deref()).await)
    }

    pub async fn connect(&self) -> Result<(), JsValue> {
        map_err_to_js!(self.inner.connect().await)
    }

    pub async fn disconnect(&self) -> Result<(), JsValue> {
        map_err_to_js!(self.inner.disconnect().await)
    }

    /// Sign and send a serialized transaction. Resolves to the base58 signature.
    ///
    /// # Arguments
    /// * `transaction` - Serialized transaction bytes
    /// * `endpoint` - RPC endpoint URL
    /// * `commitment` - "processed", "confirmed" (default) or "finalized"
    /// * `options` - `{ skipPreflight?, preflightCommitment?, maxRetries?, minContextSlot? }`
    #[wasm_bindgen(js_name = "sendTransaction")]
    pub async fn send_transaction(
        &self,
        transaction: Vec<u8>,
        endpoint: String,
        commitment: Option<String>,
        options: JsValue,
    ) -> Result<String, JsValue> {
        let commitment: Commitment = match commitment {
            Some(c) => c.parse().map_err(to_js_error)?,
            None => Commitment::default(),
        };
        let options: Option<SendTransactionOptions> =
            if options.is_undefined() || options.is_null() {
                None
            } else {
                Some(map_err_to_js!(serde_wasm_bindgen::from_value(options))?)
            };

        let connection = Connection::new(endpoint, commitment);
        let signature = map_err_to_js!(
            self.inner
                .send_transaction(Transaction::from_bytes(transaction), &connection, options)
                .await
        )?;
        Ok(signature.to_string())
    }

    #[wasm_bindgen(js_name = "signTransaction")]
    pub async fn sign_transaction(&self, transaction: Vec<u8>) -> Result<Vec<u8>, JsValue> {
        let signed = map_err_to_js!(
            self.inner
                .sign_transaction(Transaction::from_bytes(transaction))
                .await
        )?;
        Ok(signed.into_bytes())
    }

    /// Sign an array of serialized transactions with a single approval.
    #[wasm_bindgen(js_name = "signAllTransactions")]
    pub async fn sign_all_transactions(&self, transactions: Array) -> Result<Array, JsValue> {
        let transactions = transactions
            .iter()
            .map(|tx| {
                tx.dyn_into::<Uint8Array>()
                    .map(|bytes| Transaction::from_bytes(bytes.to_vec()))
                    .map_err(|_| JsValue::from_str("Transactions must be Uint8Arrays"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let signed = map_err_to_js!(self.inner.sign_all_transactions(transactions).await)?;
        Ok(signed
            .iter()
            .map(|tx| JsValue::from(Uint8Array::from(tx.as_bytes())))
            .collect())
    }

    #[wasm_bindgen(js_name = "signMessage")]
    pub async fn sign_message(&self, message: Vec<u8>) -> Result<Vec<u8>, JsValue> {
        map_err_to_js!(self.inner.sign_message(message).await)
    }

    /// Current snapshot, without subscribing.
    pub fn snapshot(&self) -> WalletSnapshot {
        WalletSnapshot::from(&self.inner.snapshot())
    }

    /// Call `callback` with the current snapshot and every later one.
    pub fn subscribe(&self, callback: Function) -> StoreSubscription {
        let subscription = self.inner.subscribe(move |snapshot| {
            let snapshot = JsValue::from(WalletSnapshot::from(snapshot));
            if let Err(e) = callback.call1(&JsValue::NULL, &snapshot) {
                log::error!("Snapshot subscriber threw: {:?}", e);
            }
        });
        StoreSubscription {
            inner: Some(subscription),
        }
    }

    /// Configured wallets as `{ name, url, icon? }` objects.
    pub fn wallets(&self) -> Result<JsValue, JsValue> {
        let wallets: Vec<WalletInfo> = self.inner.registry().iter().map(|w| w.info()).collect();
        to_js_value(&wallets)
    }

    #[wasm_bindgen(getter, js_name = "persistenceKey")]
    pub fn persistence_key(&self) -> String {
        self.inner.persistence_key().to_string()
    }

    /// Stop autoconnect and deselect the wallet.
    pub async fn teardown(&self) -> Result<(), JsValue> {
        map_err_to_js!(self.inner.teardown().await)
    }
}

/// Handle returned by [`WalletStore::subscribe`].
#[wasm_bindgen]
pub struct StoreSubscription {
    inner: Option<wallet_core::Subscription>,
}

#[wasm_bindgen]
impl StoreSubscription {
    pub fn unsubscribe(&mut self) {
        if let Some(subscription) = self.inner.take() {
            subscription.unsubscribe();
        }
    }

    #[wasm_bindgen(getter, js_name = "isActive")]
    pub fn is_active(&self) -> bool {
        self.inner.as_ref().is_some_and(|s| s.is_active())
    }
}
