//! Bridges JavaScript wallet adapters and browser services into the core traits.

use js_sys::{Array, Function, Promise, Reflect, Uint8Array};
use std::cell::{Cell, RefCell};
use walletstore_core::{
    AdapterError, AdapterEvent, AdapterEventKind, AdapterFuture, CapabilitySet, Connection,
    EventHandler, ListenerId, PublicKey, SendTransactionOptions, SignAllTransactions, SignMessage,
    SignTransaction, Spawner, TaskFuture, Transaction, TransactionSignature, UrlOpener,
    WalletAdapter,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

/// Runs detached tasks on the browser microtask queue.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalSpawner;

impl Spawner for LocalSpawner {
    fn spawn(&self, task: TaskFuture) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

/// Opens install pages in a new browser tab.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowUrlOpener;

impl UrlOpener for WindowUrlOpener {
    fn open(&self, url: &str) {
        let Some(window) = web_sys::window() else {
            log::warn!("No window to open {url} in");
            return;
        };
        if let Err(e) = window.open_with_url_and_target(url, "_blank") {
            log::warn!("Failed to open {url}: {:?}", e);
        }
    }
}

struct JsListener {
    id: ListenerId,
    kind: AdapterEventKind,
    closure: Closure<dyn FnMut(JsValue)>,
}

/// A JavaScript wallet adapter object seen through [`WalletAdapter`].
///
/// The object must expose `connect()`, `disconnect()`, `sendTransaction()`,
/// `on(event, fn)`, `off(event, fn)` and a `publicKey` property. The optional
/// `signTransaction`, `signAllTransactions` and `signMessage` methods are
/// detected once, when the adapter is wrapped.
///
/// Transactions and messages cross the boundary as `Uint8Array`s.
pub struct JsWalletAdapter {
    adapter: JsValue,
    capabilities: CapabilitySet,
    listeners: RefCell<Vec<JsListener>>,
    next_id: Cell<u64>,
}

impl JsWalletAdapter {
    pub fn new(adapter: JsValue) -> Self {
        let capabilities = CapabilitySet {
            sign_transaction: has_method(&adapter, "signTransaction"),
            sign_all_transactions: has_method(&adapter, "signAllTransactions"),
            sign_message: has_method(&adapter, "signMessage"),
        };
        Self {
            adapter,
            capabilities,
            listeners: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
        }
    }

    pub fn capabilities(&self) -> CapabilitySet {
        self.capabilities
    }

    /// Call `method` on the wrapped object synchronously.
    fn invoke(&self, method: &str, args: &Array) -> Result<JsValue, JsValue> {
        let function: Function = Reflect::get(&self.adapter, &JsValue::from_str(method))?
            .dyn_into()
            .map_err(|_| JsValue::from_str(&format!("Adapter has no method {method}")))?;
        function.apply(&self.adapter, args)
    }
}

impl Drop for JsWalletAdapter {
    fn drop(&mut self) {
        for listener in self.listeners.get_mut().drain(..) {
            let args = Array::of2(
                &JsValue::from_str(listener.kind.as_str()),
                listener.closure.as_ref(),
            );
            if let Ok(function) = Reflect::get(&self.adapter, &JsValue::from_str("off")) {
                if let Ok(function) = function.dyn_into::<Function>() {
                    function.apply(&self.adapter, &args).ok();
                }
            }
        }
    }
}

fn has_method(object: &JsValue, name: &str) -> bool {
    Reflect::get(object, &JsValue::from_str(name))
        .map(|value| value.is_function())
        .unwrap_or(false)
}

/// Await `value` if it is a promise, otherwise return it as is.
async fn resolve(value: Result<JsValue, JsValue>) -> Result<JsValue, JsValue> {
    JsFuture::from(Promise::resolve(&value?)).await
}

/// Human readable message from a thrown value.
fn js_error_message(err: &JsValue) -> String {
    if let Some(message) = Reflect::get(err, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
    {
        return message;
    }
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}

/// Map a thrown value to an adapter error, recognising well-known error names.
fn adapter_error(err: &JsValue, fallback: fn(String) -> AdapterError) -> AdapterError {
    let name = Reflect::get(err, &JsValue::from_str("name"))
        .ok()
        .and_then(|n| n.as_string())
        .unwrap_or_default();
    match name.as_str() {
        "WalletWindowClosedError" => AdapterError::WindowClosed,
        "WalletNotConnectedError" => AdapterError::NotConnected,
        _ => fallback(js_error_message(err)),
    }
}

/// Read a public key given as a base58 string, an object with `toBase58()`,
/// or 32 raw bytes.
fn public_key_from_js(value: &JsValue) -> Option<PublicKey> {
    if let Some(s) = value.as_string() {
        return s.parse().ok();
    }
    if let Some(bytes) = value.dyn_ref::<Uint8Array>() {
        let bytes: [u8; 32] = bytes.to_vec().try_into().ok()?;
        return Some(PublicKey::new(bytes));
    }
    if value.is_object() && has_method(value, "toBase58") {
        let function: Function = Reflect::get(value, &JsValue::from_str("toBase58"))
            .ok()?
            .dyn_into()
            .ok()?;
        return function.call0(value).ok()?.as_string()?.parse().ok();
    }
    None
}

fn signature_from_js(value: &JsValue) -> Result<TransactionSignature, AdapterError> {
    if let Some(s) = value.as_string() {
        return s
            .parse()
            .map_err(|e| AdapterError::SendTransaction(format!("Invalid signature {s}: {e}")));
    }
    if let Some(bytes) = value.dyn_ref::<Uint8Array>() {
        let bytes: [u8; 64] = bytes.to_vec().try_into().map_err(|v: Vec<u8>| {
            AdapterError::SendTransaction(format!("Expected 64 signature bytes, got {}", v.len()))
        })?;
        return Ok(TransactionSignature::new(bytes));
    }
    Err(AdapterError::SendTransaction(
        "sendTransaction did not return a signature".into(),
    ))
}

fn bytes_from_js(value: &JsValue, error: fn(String) -> AdapterError) -> Result<Vec<u8>, AdapterError> {
    value
        .dyn_ref::<Uint8Array>()
        .map(Uint8Array::to_vec)
        .ok_or_else(|| error("Expected a Uint8Array".into()))
}

fn event_from_js(kind: AdapterEventKind, arg: &JsValue) -> AdapterEvent {
    match kind {
        AdapterEventKind::Ready => AdapterEvent::Ready,
        AdapterEventKind::Connect => AdapterEvent::Connect(public_key_from_js(arg)),
        AdapterEventKind::Disconnect => AdapterEvent::Disconnect,
        AdapterEventKind::Error => AdapterEvent::Error(adapter_error(arg, AdapterError::Other)),
    }
}

impl WalletAdapter for JsWalletAdapter {
    fn connect(&self) -> AdapterFuture<'_, ()> {
        let call = self.invoke("connect", &Array::new());
        Box::pin(async move {
            resolve(call)
                .await
                .map(|_| ())
                .map_err(|e| adapter_error(&e, AdapterError::Connection))
        })
    }

    fn disconnect(&self) -> AdapterFuture<'_, ()> {
        let call = self.invoke("disconnect", &Array::new());
        Box::pin(async move {
            resolve(call)
                .await
                .map(|_| ())
                .map_err(|e| adapter_error(&e, AdapterError::Disconnection))
        })
    }

    fn on(&self, kind: AdapterEventKind, handler: EventHandler) -> ListenerId {
        let id = ListenerId::new(self.next_id.get());
        self.next_id.set(id.raw() + 1);

        let closure = Closure::<dyn FnMut(JsValue)>::new(move |arg: JsValue| {
            handler(&event_from_js(kind, &arg));
        });

        let args = Array::of2(&JsValue::from_str(kind.as_str()), closure.as_ref());
        if let Err(e) = self.invoke("on", &args) {
            log::warn!(
                "Failed to subscribe to {}: {}",
                kind.as_str(),
                js_error_message(&e)
            );
        }
        self.listeners
            .borrow_mut()
            .push(JsListener { id, kind, closure });
        id
    }

    fn off(&self, kind: AdapterEventKind, id: ListenerId) -> bool {
        let removed = {
            let mut listeners = self.listeners.borrow_mut();
            listeners
                .iter()
                .position(|l| l.id == id && l.kind == kind)
                .map(|index| listeners.remove(index))
        };
        let Some(listener) = removed else {
            return false;
        };

        let args = Array::of2(
            &JsValue::from_str(kind.as_str()),
            listener.closure.as_ref(),
        );
        if let Err(e) = self.invoke("off", &args) {
            log::warn!(
                "Failed to unsubscribe from {}: {}",
                kind.as_str(),
                js_error_message(&e)
            );
        }
        true
    }

    fn public_key(&self) -> Option<PublicKey> {
        Reflect::get(&self.adapter, &JsValue::from_str("publicKey"))
            .ok()
            .and_then(|v| public_key_from_js(&v))
    }

    fn send_transaction<'a>(
        &'a self,
        transaction: Transaction,
        connection: &'a Connection,
        options: Option<SendTransactionOptions>,
    ) -> AdapterFuture<'a, TransactionSignature> {
        Box::pin(async move {
            let connection = crate::to_js_value(connection)
                .map_err(|e| AdapterError::SendTransaction(js_error_message(&e)))?;
            let options = match options {
                Some(options) => crate::to_js_value(&options)
                    .map_err(|e| AdapterError::SendTransaction(js_error_message(&e)))?,
                None => JsValue::UNDEFINED,
            };
            let args = Array::of3(
                &Uint8Array::from(transaction.as_bytes()).into(),
                &connection,
                &options,
            );
            let value = resolve(self.invoke("sendTransaction", &args))
                .await
                .map_err(|e| adapter_error(&e, AdapterError::SendTransaction))?;
            signature_from_js(&value)
        })
    }

    fn as_sign_transaction(&self) -> Option<&dyn SignTransaction> {
        self.capabilities
            .sign_transaction
            .then_some(self as &dyn SignTransaction)
    }

    fn as_sign_all_transactions(&self) -> Option<&dyn SignAllTransactions> {
        self.capabilities
            .sign_all_transactions
            .then_some(self as &dyn SignAllTransactions)
    }

    fn as_sign_message(&self) -> Option<&dyn SignMessage> {
        self.capabilities
            .sign_message
            .then_some(self as &dyn SignMessage)
    }
}

impl SignTransaction for JsWalletAdapter {
    fn sign_transaction(&self, transaction: Transaction) -> AdapterFuture<'_, Transaction> {
        let args = Array::of1(&Uint8Array::from(transaction.as_bytes()).into());
        let call = self.invoke("signTransaction", &args);
        Box::pin(async move {
            let value = resolve(call)
                .await
                .map_err(|e| adapter_error(&e, AdapterError::SignTransaction))?;
            Ok(Transaction::from_bytes(bytes_from_js(
                &value,
                AdapterError::SignTransaction,
            )?))
        })
    }
}

impl SignAllTransactions for JsWalletAdapter {
    fn sign_all_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> AdapterFuture<'_, Vec<Transaction>> {
        let batch: Array = transactions
            .iter()
            .map(|tx| JsValue::from(Uint8Array::from(tx.as_bytes())))
            .collect();
        let call = self.invoke("signAllTransactions", &Array::of1(&batch));
        Box::pin(async move {
            let value = resolve(call)
                .await
                .map_err(|e| adapter_error(&e, AdapterError::SignTransaction))?;
            let signed: Array = value
                .dyn_into()
                .map_err(|_| AdapterError::SignTransaction("Expected an array".into()))?;
            signed
                .iter()
                .map(|tx| {
                    bytes_from_js(&tx, AdapterError::SignTransaction).map(Transaction::from_bytes)
                })
                .collect()
        })
    }
}

impl SignMessage for JsWalletAdapter {
    fn sign_message(&self, message: Vec<u8>) -> AdapterFuture<'_, Vec<u8>> {
        let args = Array::of1(&Uint8Array::from(message.as_slice()).into());
        let call = self.invoke("signMessage", &args);
        Box::pin(async move {
            let value = resolve(call)
                .await
                .map_err(|e| adapter_error(&e, AdapterError::SignMessage))?;
            bytes_from_js(&value, AdapterError::SignMessage)
        })
    }
}
