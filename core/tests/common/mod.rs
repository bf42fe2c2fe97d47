//! Shared test doubles for the store integration tests.

#![allow(dead_code)]

use futures::channel::oneshot;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use walletstore_core::{
    AdapterError, AdapterEvent, AdapterEventKind, AdapterEvents, AdapterFuture, CapabilitySet,
    Connection, EventHandler, ListenerId, PreferenceStorage, PublicKey, SendTransactionOptions,
    SignAllTransactions, SignMessage, SignTransaction, Spawner, StorageFuture, TaskFuture,
    Transaction, TransactionSignature, UrlOpener, WalletAdapter, WalletDescriptor, WalletSnapshot,
    WalletStore,
};

pub fn key(byte: u8) -> PublicKey {
    PublicKey::new([byte; 32])
}

/// How the mock answers `connect`.
#[derive(Clone)]
pub enum ConnectBehavior {
    /// Emit a `connect` event with this key, then resolve.
    Approve(PublicKey),
    /// Resolve without emitting anything; the test emits later.
    Silent,
    Reject(AdapterError),
}

/// Scriptable adapter that counts every call it receives.
pub struct MockAdapter {
    pub name: String,
    events: AdapterEvents,
    capabilities: CapabilitySet,
    connect_behavior: Mutex<ConnectBehavior>,
    disconnect_error: Mutex<Option<AdapterError>>,
    disconnect_gate: Mutex<Option<oneshot::Receiver<()>>>,
    public_key: Mutex<Option<PublicKey>>,
    pub connect_calls: AtomicUsize,
    pub disconnect_calls: AtomicUsize,
    pub send_calls: AtomicUsize,
    pub sign_calls: AtomicUsize,
}

impl MockAdapter {
    pub fn new(name: &str, capabilities: CapabilitySet, connect: ConnectBehavior) -> Self {
        Self {
            name: name.to_string(),
            events: AdapterEvents::new(),
            capabilities,
            connect_behavior: Mutex::new(connect),
            disconnect_error: Mutex::new(None),
            disconnect_gate: Mutex::new(None),
            public_key: Mutex::new(None),
            connect_calls: AtomicUsize::new(0),
            disconnect_calls: AtomicUsize::new(0),
            send_calls: AtomicUsize::new(0),
            sign_calls: AtomicUsize::new(0),
        }
    }

    pub fn emit(&self, event: AdapterEvent) -> usize {
        if let AdapterEvent::Connect(Some(key)) = &event {
            *self.public_key.lock().unwrap() = Some(*key);
        }
        if event == AdapterEvent::Disconnect {
            *self.public_key.lock().unwrap() = None;
        }
        self.events.emit(&event)
    }

    pub fn set_connect_behavior(&self, behavior: ConnectBehavior) {
        *self.connect_behavior.lock().unwrap() = behavior;
    }

    /// Account reported by `public_key()`, as if set out of band.
    pub fn set_public_key(&self, key: Option<PublicKey>) {
        *self.public_key.lock().unwrap() = key;
    }

    /// Keep the next `disconnect` pending until the returned sender fires.
    pub fn hold_disconnect(&self) -> oneshot::Sender<()> {
        let (release, gate) = oneshot::channel();
        *self.disconnect_gate.lock().unwrap() = Some(gate);
        release
    }

    pub fn fail_disconnect(&self, error: AdapterError) {
        *self.disconnect_error.lock().unwrap() = Some(error);
    }

    pub fn listeners(&self) -> usize {
        self.events.total_listeners()
    }

    pub fn listeners_for(&self, kind: AdapterEventKind) -> usize {
        self.events.listener_count(kind)
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

impl WalletAdapter for MockAdapter {
    fn connect(&self) -> AdapterFuture<'_, ()> {
        self.connect_calls.fetch_add(1, Ordering::SeqCst);
        let behavior = self.connect_behavior.lock().unwrap().clone();
        Box::pin(async move {
            match behavior {
                ConnectBehavior::Approve(key) => {
                    self.emit(AdapterEvent::Connect(Some(key)));
                    Ok(())
                }
                ConnectBehavior::Silent => Ok(()),
                ConnectBehavior::Reject(e) => Err(e),
            }
        })
    }

    fn disconnect(&self) -> AdapterFuture<'_, ()> {
        self.disconnect_calls.fetch_add(1, Ordering::SeqCst);
        let error = self.disconnect_error.lock().unwrap().clone();
        let gate = self.disconnect_gate.lock().unwrap().take();
        Box::pin(async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            if let Some(e) = error {
                return Err(e);
            }
            if self.public_key.lock().unwrap().is_some() {
                self.emit(AdapterEvent::Disconnect);
            }
            Ok(())
        })
    }

    fn on(&self, kind: AdapterEventKind, handler: EventHandler) -> ListenerId {
        self.events.on(kind, handler)
    }

    fn off(&self, kind: AdapterEventKind, id: ListenerId) -> bool {
        self.events.off(kind, id)
    }

    fn public_key(&self) -> Option<PublicKey> {
        *self.public_key.lock().unwrap()
    }

    fn send_transaction<'a>(
        &'a self,
        _transaction: Transaction,
        _connection: &'a Connection,
        _options: Option<SendTransactionOptions>,
    ) -> AdapterFuture<'a, TransactionSignature> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async { Ok(TransactionSignature::new([7; 64])) })
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

fn signed(transaction: Transaction) -> Transaction {
    let mut bytes = transaction.into_bytes();
    bytes.extend_from_slice(b"-signed");
    Transaction::from_bytes(bytes)
}

impl SignTransaction for MockAdapter {
    fn sign_transaction(&self, transaction: Transaction) -> AdapterFuture<'_, Transaction> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move { Ok(signed(transaction)) })
    }
}

impl SignAllTransactions for MockAdapter {
    fn sign_all_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> AdapterFuture<'_, Vec<Transaction>> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move { Ok(transactions.into_iter().map(signed).collect()) })
    }
}

impl SignMessage for MockAdapter {
    fn sign_message(&self, message: Vec<u8>) -> AdapterFuture<'_, Vec<u8>> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            let mut signature = b"sig:".to_vec();
            signature.extend(message);
            Ok(signature)
        })
    }
}

/// A registered wallet plus every adapter instance its factory created.
#[derive(Clone)]
pub struct MockWallet {
    pub name: String,
    pub url: String,
    capabilities: CapabilitySet,
    connect: ConnectBehavior,
    instances: Arc<Mutex<Vec<Arc<MockAdapter>>>>,
}

impl MockWallet {
    pub fn new(name: &str, url: &str, capabilities: CapabilitySet, connect: ConnectBehavior) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            capabilities,
            connect,
            instances: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn descriptor(&self) -> WalletDescriptor {
        let wallet = self.clone();
        WalletDescriptor::new(&self.name, &self.url, move || -> Arc<dyn WalletAdapter> {
            let adapter = Arc::new(MockAdapter::new(
                &wallet.name,
                wallet.capabilities,
                wallet.connect.clone(),
            ));
            wallet.instances.lock().unwrap().push(adapter.clone());
            adapter
        })
    }

    /// The most recently created adapter.
    pub fn adapter(&self) -> Arc<MockAdapter> {
        self.instances
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no adapter created yet")
    }

    pub fn created(&self) -> usize {
        self.instances.lock().unwrap().len()
    }
}

pub fn phantom() -> MockWallet {
    MockWallet::new(
        "Phantom",
        "https://phantom.app",
        CapabilitySet::ALL,
        ConnectBehavior::Approve(key(1)),
    )
}

/// Solflare without message signing.
pub fn solflare() -> MockWallet {
    MockWallet::new(
        "Solflare",
        "https://solflare.com",
        CapabilitySet {
            sign_transaction: true,
            sign_all_transactions: true,
            sign_message: false,
        },
        ConnectBehavior::Approve(key(2)),
    )
}

/// Storage holding one saved name whose first read waits for a release.
pub struct GatedStorage {
    saved: String,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
}

impl GatedStorage {
    pub fn new(saved: &str) -> (Self, oneshot::Sender<()>) {
        let (release, gate) = oneshot::channel();
        let storage = Self {
            saved: saved.to_string(),
            gate: Mutex::new(Some(gate)),
        };
        (storage, release)
    }
}

impl PreferenceStorage for GatedStorage {
    fn get(&self, _key: &str) -> StorageFuture<'_, Option<String>> {
        let gate = self.gate.lock().unwrap().take();
        Box::pin(async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            Ok(Some(self.saved.clone()))
        })
    }

    fn set(&self, _key: &str, _value: &str) -> StorageFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }
}

/// Records every URL it is asked to open.
#[derive(Default)]
pub struct RecordingUrlOpener {
    pub opened: Mutex<Vec<String>>,
}

impl UrlOpener for RecordingUrlOpener {
    fn open(&self, url: &str) {
        self.opened.lock().unwrap().push(url.to_string());
    }
}

pub struct TokioSpawner;

impl Spawner for TokioSpawner {
    fn spawn(&self, task: TaskFuture) {
        tokio::spawn(task);
    }
}

/// Collects every snapshot a subscriber receives.
pub fn record(store: &WalletStore) -> (Arc<Mutex<Vec<WalletSnapshot>>>, walletstore_core::Subscription) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let subscription = store.subscribe(move |snapshot| sink.lock().unwrap().push(snapshot.clone()));
    (seen, subscription)
}

/// Let spawned tasks run.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}
