//! Wallet Store SDK - Core Library
//!
//! Platform-agnostic connection lifecycle for browser-extension style wallets.
//!
//! This crate selects one wallet out of a registry, drives its adapter through
//! `NotReady -> Ready -> Connecting -> Connected`, publishes every change to
//! subscribers as a [`WalletSnapshot`], persists the selected wallet across
//! sessions, and hands out signing handles that refuse to work unless the
//! wallet that produced them is still selected and connected.
//!
//! Adapters, preference storage, task spawning and URL opening are abstracted
//! through traits so the same store runs natively and in WebAssembly.
//!
//! # Example
//!
//! ```rust,ignore
//! use walletstore_core::{StoreOptions, WalletDescriptor, WalletStore};
//!
//! let phantom = WalletDescriptor::new("Phantom", "https://phantom.app", || {
//!     Arc::new(PhantomAdapter::new())
//! });
//!
//! let store = WalletStore::new(
//!     StoreOptions::new(vec![phantom]).with_storage(Arc::new(my_storage)),
//! )?;
//! store.init().await;
//!
//! let _subscription = store.subscribe(|snapshot| println!("{snapshot:?}"));
//! store.select(Some("Phantom")).await?;
//! store.connect().await?;
//! ```

pub mod adapter;
pub mod autoconnect;
pub mod config;
pub mod error;
pub mod observable;
pub mod registry;
pub mod runtime;
pub mod signer;
pub mod storage;
pub mod store;
pub mod types;

pub use adapter::{
    AdapterEvent, AdapterEventKind, AdapterEvents, AdapterFuture, EventHandler, ListenerId,
    SignAllTransactions, SignMessage, SignTransaction, WalletAdapter,
};
pub use autoconnect::Autoconnect;
pub use config::{DEFAULT_PERSISTENCE_KEY, ErrorHandler, LogUrlOpener, StoreOptions, UrlOpener};
pub use error::{AdapterError, Error, Result};
pub use observable::{Observable, Subscription};
pub use registry::{AdapterFactory, WalletDescriptor, WalletInfo, WalletRegistry};
pub use runtime::{MaybeSendSync, Spawner, TaskFuture};
pub use signer::{GuardedSignAllTransactions, GuardedSignMessage, GuardedSignTransaction};
pub use storage::memory::MemoryPreferenceStorage;
pub use storage::{PreferenceStorage, SelectionPersistence, StorageFuture};
pub use store::{WalletSnapshot, WalletStore, WeakWalletStore};
pub use types::{
    CapabilitySet, Commitment, Connection, ConnectionState, PublicKey, SendTransactionOptions,
    Transaction, TransactionSignature,
};
