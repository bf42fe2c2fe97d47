//! The wallet store: connection state and adapter lifecycle.
//!
//! [`WalletStore`] owns the single source of truth for which wallet is
//! selected, what state its adapter is in, and which signing operations are
//! available. Callers drive it through `select`/`connect`/`disconnect`; the
//! adapter drives it through its lifecycle events. Every change is published
//! as a [`WalletSnapshot`] to all subscribers, in order.
//!
//! State machine:
//!
//! ```text
//!  select(name) ──► NotReady ──ready──► Ready ──connect()──► Connecting ──connect event──► Connected
//!                                        ▲  ▲                    │                              │
//!                                        │  └──connect() failed──┘                              │
//!                                        └──────────────────disconnect event────────────────────┘
//! ```

use crate::adapter::{AdapterEvent, AdapterEventKind, EventHandler, ListenerId, WalletAdapter};
use crate::autoconnect::Autoconnect;
use crate::config::{ErrorHandler, LogUrlOpener, StoreOptions, UrlOpener, default_error_handler};
use crate::error::{AdapterError, Error, Result};
use crate::observable::{Observable, Subscription};
use crate::registry::{WalletDescriptor, WalletInfo, WalletRegistry};
use crate::runtime::{MaybeSendSync, lock};
use crate::signer::{
    ActivationGuard, GuardedSignAllTransactions, GuardedSignMessage, GuardedSignTransaction,
};
use crate::storage::SelectionPersistence;
use crate::types::{
    CapabilitySet, Connection, ConnectionState, PublicKey, SendTransactionOptions, Transaction,
    TransactionSignature,
};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

/// Externally observable state of the store at one instant.
///
/// The signing handles are present exactly when the selected adapter
/// implements the corresponding capability.
#[derive(Clone, Default)]
pub struct WalletSnapshot {
    pub wallet: Option<Arc<WalletDescriptor>>,
    pub public_key: Option<PublicKey>,
    pub state: ConnectionState,
    pub sign_transaction: Option<GuardedSignTransaction>,
    pub sign_all_transactions: Option<GuardedSignAllTransactions>,
    pub sign_message: Option<GuardedSignMessage>,
    activation: u64,
}

impl WalletSnapshot {
    pub fn wallet_info(&self) -> Option<WalletInfo> {
        self.wallet.as_ref().map(|w| w.info())
    }

    pub fn wallet_name(&self) -> Option<&str> {
        self.wallet.as_ref().map(|w| w.name())
    }

    pub fn capabilities(&self) -> CapabilitySet {
        CapabilitySet {
            sign_transaction: self.sign_transaction.is_some(),
            sign_all_transactions: self.sign_all_transactions.is_some(),
            sign_message: self.sign_message.is_some(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}

impl fmt::Debug for WalletSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletSnapshot")
            .field("wallet", &self.wallet_name())
            .field("public_key", &self.public_key)
            .field("state", &self.state)
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

/// The adapter currently owned by the store.
struct ActiveAdapter {
    activation: u64,
    descriptor: Arc<WalletDescriptor>,
    adapter: Arc<dyn WalletAdapter>,
    listeners: Vec<(AdapterEventKind, ListenerId)>,
}

pub(crate) struct StoreInner {
    registry: WalletRegistry,
    persistence: SelectionPersistence,
    snapshot: Observable<WalletSnapshot>,
    active: Mutex<Option<ActiveAdapter>>,
    switching: futures::lock::Mutex<()>,
    activations: AtomicU64,
    on_error: ErrorHandler,
    url_opener: Arc<dyn UrlOpener>,
    autoconnect: Mutex<Option<Autoconnect>>,
}

impl StoreInner {
    /// Ok if `activation` is the running adapter and it is connected.
    pub(crate) fn ensure_connected(&self, activation: u64) -> Result<()> {
        self.snapshot.with(|s| {
            if s.activation == activation && s.state == ConnectionState::Connected {
                Ok(())
            } else {
                Err(Error::WalletNotConnected)
            }
        })
    }

    fn next_activation(&self) -> u64 {
        self.activations.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Apply `f` to the snapshot if it still belongs to `activation`.
    fn transition(&self, activation: u64, f: impl FnOnce(&mut WalletSnapshot) -> bool) -> bool {
        self.snapshot
            .update_if(|s| s.activation == activation && f(s))
    }

    fn handle_event(
        &self,
        activation: u64,
        adapter: &Weak<dyn WalletAdapter>,
        event: &AdapterEvent,
    ) {
        match event {
            AdapterEvent::Ready => {
                let changed = self.transition(activation, |s| {
                    if s.state != ConnectionState::NotReady {
                        return false;
                    }
                    s.state = ConnectionState::Ready;
                    true
                });
                if changed {
                    log::debug!("Wallet ready");
                }
            }
            AdapterEvent::Connect(public_key) => {
                let public_key = (*public_key)
                    .or_else(|| adapter.upgrade().and_then(|adapter| adapter.public_key()));
                let Some(public_key) = public_key else {
                    if self.snapshot.with(|s| s.activation == activation) {
                        (self.on_error)(&Error::Adapter(AdapterError::PublicKey(
                            "connect event carried no public key".into(),
                        )));
                    }
                    return;
                };
                if self.transition(activation, |s| {
                    s.state = ConnectionState::Connected;
                    s.public_key = Some(public_key);
                    true
                }) {
                    log::info!("Wallet connected as {public_key}");
                }
            }
            AdapterEvent::Disconnect => {
                if self.transition(activation, |s| {
                    s.state = ConnectionState::Ready;
                    s.public_key = None;
                    true
                }) {
                    log::info!("Wallet disconnected");
                }
            }
            AdapterEvent::Error(err) => {
                if self.snapshot.with(|s| s.activation == activation) {
                    (self.on_error)(&Error::Adapter(err.clone()));
                }
            }
        }
    }
}

/// Handle to a wallet store. Cloning is cheap; clones share one store.
#[derive(Clone)]
pub struct WalletStore {
    inner: Arc<StoreInner>,
}

/// Non-owning handle, see [`WalletStore::downgrade`].
#[derive(Clone)]
pub struct WeakWalletStore {
    inner: Weak<StoreInner>,
}

impl WeakWalletStore {
    pub fn upgrade(&self) -> Option<WalletStore> {
        self.inner.upgrade().map(|inner| WalletStore { inner })
    }
}

impl WalletStore {
    /// Create a store from `options`.
    ///
    /// No wallet is selected yet; call [`init`](Self::init) to restore the
    /// previously selected one.
    pub fn new(options: StoreOptions) -> Result<Self> {
        options.validate()?;
        let persistence_key = options.persistence_key().to_string();

        let StoreOptions {
            wallets,
            autoconnect,
            on_error,
            storage,
            spawner,
            url_opener,
            ..
        } = options;

        let registry = WalletRegistry::new(wallets);
        log::debug!("Wallet store created with wallets {:?}", registry.names());

        let store = WalletStore {
            inner: Arc::new(StoreInner {
                registry,
                persistence: SelectionPersistence::new(persistence_key, storage),
                snapshot: Observable::new(WalletSnapshot::default()),
                active: Mutex::new(None),
                switching: futures::lock::Mutex::new(()),
                activations: AtomicU64::new(0),
                on_error: on_error.unwrap_or_else(default_error_handler),
                url_opener: url_opener.unwrap_or_else(|| Arc::new(LogUrlOpener)),
                autoconnect: Mutex::new(None),
            }),
        };

        if autoconnect {
            let spawner = spawner
                .ok_or_else(|| Error::Config("autoconnect requires a spawner".into()))?;
            let controller = Autoconnect::attach(&store, spawner);
            *lock(&store.inner.autoconnect) = Some(controller);
            log::debug!("Autoconnect enabled");
        }

        Ok(store)
    }

    /// Restore the wallet saved by a previous session.
    ///
    /// Best-effort: returns the restored wallet name, or `None` when nothing
    /// was saved, the saved wallet is no longer registered, or a wallet was
    /// selected in the meantime.
    pub async fn init(&self) -> Option<String> {
        let saved = self.inner.persistence.load().await?;
        let target = match self.inner.registry.get(&saved) {
            Ok(target) => target,
            Err(e) => {
                log::warn!("Could not restore wallet {saved}: {e}");
                return None;
            }
        };

        let _switching = self.inner.switching.lock().await;
        if let Some(current) = self.inner.snapshot.with(|s| s.wallet.clone()) {
            log::debug!("Wallet {} already selected, not restoring {saved}", current.name());
            return None;
        }
        self.switch_adapter(Some(target)).await;
        log::info!("Restored previously selected wallet {saved}");
        Some(saved)
    }

    pub fn downgrade(&self) -> WeakWalletStore {
        WeakWalletStore {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Current snapshot, without subscribing.
    pub fn snapshot(&self) -> WalletSnapshot {
        self.inner.snapshot.get()
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.snapshot.with(|s| s.state)
    }

    /// Receive the current snapshot now and every later one, in order.
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&WalletSnapshot) + MaybeSendSync + 'static,
    {
        self.inner.snapshot.subscribe(callback)
    }

    pub fn registry(&self) -> &WalletRegistry {
        &self.inner.registry
    }

    pub fn persistence_key(&self) -> &str {
        self.inner.persistence.key()
    }

    pub fn is_autoconnect_enabled(&self) -> bool {
        lock(&self.inner.autoconnect).is_some()
    }

    /// Select a wallet by name, or deselect with `None`.
    ///
    /// The previous adapter is unsubscribed and disconnected before the new
    /// one is created. Selecting the wallet that is already active is a no-op.
    /// An unknown name fails with [`Error::WalletNotFound`] and leaves the
    /// current selection untouched.
    pub async fn select(&self, name: Option<&str>) -> Result<()> {
        let target = match name.filter(|n| !n.is_empty()) {
            Some(name) => Some(self.inner.registry.get(name)?),
            None => None,
        };

        let _switching = self.inner.switching.lock().await;

        self.inner
            .persistence
            .save(target.as_ref().map(|w| w.name()))
            .await;

        let current = self.inner.snapshot.with(|s| s.wallet.clone());
        let unchanged = match (&current, &target) {
            (Some(current), Some(target)) => Arc::ptr_eq(current, target),
            (None, None) => true,
            _ => false,
        };
        if unchanged {
            return Ok(());
        }

        self.switch_adapter(target).await;
        Ok(())
    }

    async fn switch_adapter(&self, target: Option<Arc<WalletDescriptor>>) {
        let previous = lock(&self.inner.active).take();
        if let Some(previous) = previous {
            self.teardown_adapter(previous).await;
        }

        let activation = self.inner.next_activation();
        let Some(descriptor) = target else {
            self.inner.snapshot.set(WalletSnapshot {
                activation,
                ..WalletSnapshot::default()
            });
            log::info!("Wallet deselected");
            return;
        };

        let adapter = descriptor.create_adapter();
        let capabilities = CapabilitySet::detect(adapter.as_ref());
        let guard = ActivationGuard::new(Arc::downgrade(&self.inner), activation);
        log::debug!(
            "Activating wallet {} with capabilities {capabilities:?}",
            descriptor.name()
        );

        let snapshot = WalletSnapshot {
            wallet: Some(descriptor.clone()),
            public_key: None,
            state: ConnectionState::NotReady,
            sign_transaction: capabilities
                .sign_transaction
                .then(|| GuardedSignTransaction::new(guard.clone(), adapter.clone())),
            sign_all_transactions: capabilities
                .sign_all_transactions
                .then(|| GuardedSignAllTransactions::new(guard.clone(), adapter.clone())),
            sign_message: capabilities
                .sign_message
                .then(|| GuardedSignMessage::new(guard, adapter.clone())),
            activation,
        };
        *lock(&self.inner.active) = Some(ActiveAdapter {
            activation,
            descriptor: descriptor.clone(),
            adapter: adapter.clone(),
            listeners: Vec::new(),
        });
        self.inner.snapshot.set(snapshot);

        // Listen only after publishing, so a `ready` emitted during `on` lands
        // on the new snapshot.
        let listeners = self.listen(&adapter, activation);
        if let Some(active) = lock(&self.inner.active)
            .as_mut()
            .filter(|active| active.activation == activation)
        {
            active.listeners = listeners;
        }
        log::info!("Selected wallet {}", descriptor.name());
    }

    /// Unsubscribe all listeners from `previous` and disconnect it.
    async fn teardown_adapter(&self, previous: ActiveAdapter) {
        for (kind, id) in &previous.listeners {
            if !previous.adapter.off(*kind, *id) {
                log::debug!("Listener for {} was already removed", kind.as_str());
            }
        }

        // Nothing may be signed through the old adapter while it disconnects.
        let activation = self.inner.next_activation();
        self.inner.snapshot.update(|s| {
            s.activation = activation;
            s.state = ConnectionState::NotReady;
            s.public_key = None;
            s.sign_transaction = None;
            s.sign_all_transactions = None;
            s.sign_message = None;
        });

        if let Err(e) = previous.adapter.disconnect().await {
            (self.inner.on_error)(&Error::Adapter(e));
        }
        log::debug!("Tore down wallet {}", previous.descriptor.name());
    }

    fn listen(
        &self,
        adapter: &Arc<dyn WalletAdapter>,
        activation: u64,
    ) -> Vec<(AdapterEventKind, ListenerId)> {
        AdapterEventKind::ALL
            .iter()
            .map(|&kind| {
                let store = Arc::downgrade(&self.inner);
                let source = Arc::downgrade(adapter);
                let handler: EventHandler = Arc::new(move |event: &AdapterEvent| {
                    if let Some(store) = store.upgrade() {
                        store.handle_event(activation, &source, event);
                    }
                });
                (kind, adapter.on(kind, handler))
            })
            .collect()
    }

    fn active_adapter(&self) -> Result<(Arc<dyn WalletAdapter>, Arc<WalletDescriptor>, u64)> {
        let active = lock(&self.inner.active);
        let active = active.as_ref().ok_or(Error::NoWalletSelected)?;
        Ok((
            active.adapter.clone(),
            active.descriptor.clone(),
            active.activation,
        ))
    }

    /// Ask the selected wallet to connect.
    ///
    /// Resolves once the adapter accepted the request; the store becomes
    /// `Connected` when the adapter emits its `connect` event. If the wallet
    /// is not ready yet its install page is opened and
    /// [`Error::WalletNotReady`] is returned. While a connection attempt is
    /// pending, or once connected, this returns `Ok(())` without calling the
    /// adapter again.
    pub async fn connect(&self) -> Result<()> {
        let (adapter, descriptor, activation) = self.active_adapter()?;

        let mut prior = None;
        let started = self.inner.transition(activation, |s| {
            prior = Some(s.state);
            if s.state != ConnectionState::Ready {
                return false;
            }
            s.state = ConnectionState::Connecting;
            true
        });

        if !started {
            return match prior {
                Some(ConnectionState::NotReady) => {
                    self.inner.url_opener.open(descriptor.url());
                    Err(Error::WalletNotReady)
                }
                Some(ConnectionState::Connecting) | Some(ConnectionState::Connected) => {
                    log::debug!("Connect ignored, wallet is {:?}", prior);
                    Ok(())
                }
                // The adapter was swapped out between lookup and transition
                _ => Err(Error::NoWalletSelected),
            };
        }

        log::debug!("Connecting to {}", descriptor.name());
        if let Err(e) = adapter.connect().await {
            self.inner.transition(activation, |s| {
                if s.state != ConnectionState::Connecting {
                    return false;
                }
                s.state = ConnectionState::Ready;
                true
            });
            return Err(Error::Adapter(e));
        }
        Ok(())
    }

    /// Ask the selected wallet to disconnect. No-op without a wallet.
    ///
    /// The state changes when the adapter emits its `disconnect` event.
    pub async fn disconnect(&self) -> Result<()> {
        let adapter = match self.active_adapter() {
            Ok((adapter, _, _)) => adapter,
            Err(_) => return Ok(()),
        };
        adapter.disconnect().await?;
        Ok(())
    }

    /// Sign and submit `transaction` through the connected wallet.
    pub async fn send_transaction(
        &self,
        transaction: Transaction,
        connection: &Connection,
        options: Option<SendTransactionOptions>,
    ) -> Result<TransactionSignature> {
        let (adapter, _, activation) = self.active_adapter()?;
        self.inner.ensure_connected(activation)?;
        let signature = adapter
            .send_transaction(transaction, connection, options)
            .await?;
        log::debug!("Transaction sent: {signature}");
        Ok(signature)
    }

    /// Sign one transaction via the snapshot's guarded handle.
    pub async fn sign_transaction(&self, transaction: Transaction) -> Result<Transaction> {
        let handle = self.capability(|s| s.sign_transaction.clone(), "signTransaction")?;
        handle.sign(transaction).await
    }

    pub async fn sign_all_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> Result<Vec<Transaction>> {
        let handle =
            self.capability(|s| s.sign_all_transactions.clone(), "signAllTransactions")?;
        handle.sign_all(transactions).await
    }

    pub async fn sign_message(&self, message: Vec<u8>) -> Result<Vec<u8>> {
        let handle = self.capability(|s| s.sign_message.clone(), "signMessage")?;
        handle.sign(message).await
    }

    fn capability<H>(
        &self,
        pick: impl FnOnce(&WalletSnapshot) -> Option<H>,
        name: &'static str,
    ) -> Result<H> {
        let snapshot = self.snapshot();
        if snapshot.wallet.is_none() {
            return Err(Error::NoWalletSelected);
        }
        if let Some(handle) = pick(&snapshot) {
            return Ok(handle);
        }
        // Handles are withdrawn while the previous adapter is torn down
        let running = lock(&self.inner.active)
            .as_ref()
            .is_some_and(|active| active.activation == snapshot.activation);
        if running {
            Err(Error::UnsupportedOperation(name))
        } else {
            Err(Error::WalletNotConnected)
        }
    }

    /// Shut the store down: stop autoconnect and deselect the wallet.
    pub async fn teardown(&self) -> Result<()> {
        let controller = lock(&self.inner.autoconnect).take();
        if let Some(controller) = controller {
            controller.detach();
        }
        self.select(None).await
    }
}

impl fmt::Debug for WalletStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletStore")
            .field("snapshot", &self.snapshot())
            .field("persistence", &self.inner.persistence)
            .finish_non_exhaustive()
    }
}
