//! Wallet adapter capability interface.
//!
//! An adapter is the externally supplied object that talks to one wallet brand
//! (a browser extension, a hardware device, ...). Every adapter can connect,
//! disconnect, report lifecycle events and send transactions. Signing is
//! optional: an adapter advertises each signing operation it implements through
//! the `as_*` introspection methods, which the store queries once when the
//! adapter is activated.

use crate::error::AdapterError;
use crate::runtime::{MaybeSendSync, lock};
use crate::types::{
    CapabilitySet, Connection, PublicKey, SendTransactionOptions, Transaction,
    TransactionSignature,
};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

/// Type alias for adapter futures.
#[cfg(target_arch = "wasm32")]
pub type AdapterFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AdapterError>> + 'a>>;

#[cfg(not(target_arch = "wasm32"))]
pub type AdapterFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, AdapterError>> + Send + 'a>>;

/// Callback registered for adapter events.
#[cfg(target_arch = "wasm32")]
pub type EventHandler = Arc<dyn Fn(&AdapterEvent)>;

#[cfg(not(target_arch = "wasm32"))]
pub type EventHandler = Arc<dyn Fn(&AdapterEvent) + Send + Sync>;

/// Names of the lifecycle events an adapter emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdapterEventKind {
    Ready,
    Connect,
    Disconnect,
    Error,
}

impl AdapterEventKind {
    pub const ALL: [AdapterEventKind; 4] = [
        AdapterEventKind::Ready,
        AdapterEventKind::Connect,
        AdapterEventKind::Disconnect,
        AdapterEventKind::Error,
    ];

    /// Event name as used by JavaScript wallet adapters.
    pub fn as_str(self) -> &'static str {
        match self {
            AdapterEventKind::Ready => "ready",
            AdapterEventKind::Connect => "connect",
            AdapterEventKind::Disconnect => "disconnect",
            AdapterEventKind::Error => "error",
        }
    }
}

/// A lifecycle event emitted by an adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdapterEvent {
    /// The wallet is installed and loaded.
    Ready,
    /// The user approved the connection. `None` when the event carried no
    /// account; the store then reads [`WalletAdapter::public_key`].
    Connect(Option<PublicKey>),
    Disconnect,
    /// Out-of-band failure, not tied to a pending call.
    Error(AdapterError),
}

impl AdapterEvent {
    pub fn kind(&self) -> AdapterEventKind {
        match self {
            AdapterEvent::Ready => AdapterEventKind::Ready,
            AdapterEvent::Connect(_) => AdapterEventKind::Connect,
            AdapterEvent::Disconnect => AdapterEventKind::Disconnect,
            AdapterEvent::Error(_) => AdapterEventKind::Error,
        }
    }
}

/// Token returned by [`WalletAdapter::on`], used to remove the handler again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// The mandatory surface every wallet adapter exposes.
pub trait WalletAdapter: MaybeSendSync {
    /// Ask the wallet for a connection.
    ///
    /// Resolving does not mean connected: the store waits for the
    /// [`AdapterEvent::Connect`] event.
    fn connect(&self) -> AdapterFuture<'_, ()>;

    fn disconnect(&self) -> AdapterFuture<'_, ()>;

    /// Register a handler for one event kind.
    fn on(&self, kind: AdapterEventKind, handler: EventHandler) -> ListenerId;

    /// Remove a handler. Returns `false` if it was not registered.
    fn off(&self, kind: AdapterEventKind, id: ListenerId) -> bool;

    /// Account of the current session, if connected.
    ///
    /// Consulted when a `connect` event arrives without a key.
    fn public_key(&self) -> Option<PublicKey>;

    /// Sign and submit a transaction through `connection`.
    fn send_transaction<'a>(
        &'a self,
        transaction: Transaction,
        connection: &'a Connection,
        options: Option<SendTransactionOptions>,
    ) -> AdapterFuture<'a, TransactionSignature>;

    fn as_sign_transaction(&self) -> Option<&dyn SignTransaction> {
        None
    }

    fn as_sign_all_transactions(&self) -> Option<&dyn SignAllTransactions> {
        None
    }

    fn as_sign_message(&self) -> Option<&dyn SignMessage> {
        None
    }
}

/// Optional capability: sign a single transaction without sending it.
pub trait SignTransaction: MaybeSendSync {
    fn sign_transaction(&self, transaction: Transaction) -> AdapterFuture<'_, Transaction>;
}

/// Optional capability: sign a batch of transactions with one approval.
pub trait SignAllTransactions: MaybeSendSync {
    fn sign_all_transactions(
        &self,
        transactions: Vec<Transaction>,
    ) -> AdapterFuture<'_, Vec<Transaction>>;
}

/// Optional capability: sign arbitrary bytes.
pub trait SignMessage: MaybeSendSync {
    fn sign_message(&self, message: Vec<u8>) -> AdapterFuture<'_, Vec<u8>>;
}

impl CapabilitySet {
    /// Introspect which optional signing operations `adapter` implements.
    pub fn detect(adapter: &dyn WalletAdapter) -> Self {
        Self {
            sign_transaction: adapter.as_sign_transaction().is_some(),
            sign_all_transactions: adapter.as_sign_all_transactions().is_some(),
            sign_message: adapter.as_sign_message().is_some(),
        }
    }
}

/// Listener table adapters can embed to implement `on`/`off`.
///
/// Handlers are invoked outside the internal lock, so a handler may register
/// or remove listeners while an event is being emitted.
#[derive(Default)]
pub struct AdapterEvents {
    inner: Mutex<Listeners>,
}

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, AdapterEventKind, EventHandler)>,
}

impl AdapterEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(&self, kind: AdapterEventKind, handler: EventHandler) -> ListenerId {
        let mut listeners = lock(&self.inner);
        let id = ListenerId(listeners.next_id);
        listeners.next_id += 1;
        listeners.entries.push((id, kind, handler));
        id
    }

    pub fn off(&self, kind: AdapterEventKind, id: ListenerId) -> bool {
        let mut listeners = lock(&self.inner);
        let before = listeners.entries.len();
        listeners
            .entries
            .retain(|(entry_id, entry_kind, _)| !(*entry_id == id && *entry_kind == kind));
        listeners.entries.len() != before
    }

    /// Deliver `event` to every handler registered for its kind.
    ///
    /// Returns the number of handlers invoked.
    pub fn emit(&self, event: &AdapterEvent) -> usize {
        let kind = event.kind();
        let handlers: Vec<EventHandler> = lock(&self.inner)
            .entries
            .iter()
            .filter(|(_, entry_kind, _)| *entry_kind == kind)
            .map(|(_, _, handler)| handler.clone())
            .collect();

        for handler in &handlers {
            handler(event);
        }
        handlers.len()
    }

    pub fn listener_count(&self, kind: AdapterEventKind) -> usize {
        lock(&self.inner)
            .entries
            .iter()
            .filter(|(_, entry_kind, _)| *entry_kind == kind)
            .count()
    }

    pub fn total_listeners(&self) -> usize {
        lock(&self.inner).entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting_handler(counter: &Arc<AtomicUsize>) -> EventHandler {
        let counter = counter.clone();
        Arc::new(move |_event: &AdapterEvent| {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_emit_reaches_only_matching_kind() {
        let events = AdapterEvents::new();
        let ready = Arc::new(AtomicUsize::new(0));
        let disconnect = Arc::new(AtomicUsize::new(0));

        events.on(AdapterEventKind::Ready, counting_handler(&ready));
        events.on(AdapterEventKind::Disconnect, counting_handler(&disconnect));

        assert_eq!(events.emit(&AdapterEvent::Ready), 1);
        assert_eq!(ready.load(Ordering::SeqCst), 1);
        assert_eq!(disconnect.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_off_removes_handler() {
        let events = AdapterEvents::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let id = events.on(AdapterEventKind::Ready, counting_handler(&counter));
        // Wrong kind leaves the handler in place
        assert!(!events.off(AdapterEventKind::Connect, id));
        assert!(events.off(AdapterEventKind::Ready, id));
        assert!(!events.off(AdapterEventKind::Ready, id));

        assert_eq!(events.emit(&AdapterEvent::Ready), 0);
        assert_eq!(counter.load(Ordering::SeqCst), 0);
        assert_eq!(events.total_listeners(), 0);
    }

    #[test]
    fn test_handler_may_unsubscribe_during_emit() {
        let events = Arc::new(AdapterEvents::new());
        let slot: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));

        let handler: EventHandler = {
            let events = events.clone();
            let slot = slot.clone();
            Arc::new(move |_event: &AdapterEvent| {
                if let Some(id) = slot.lock().unwrap().take() {
                    events.off(AdapterEventKind::Ready, id);
                }
            })
        };
        let id = events.on(AdapterEventKind::Ready, handler);
        *slot.lock().unwrap() = Some(id);

        assert_eq!(events.emit(&AdapterEvent::Ready), 1);
        assert_eq!(events.listener_count(AdapterEventKind::Ready), 0);
    }
}
