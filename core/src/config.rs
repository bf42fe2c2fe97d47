//! Store configuration.

use crate::error::{Error, Result};
use crate::registry::WalletDescriptor;
use crate::runtime::{MaybeSendSync, Spawner};
use crate::storage::PreferenceStorage;
use std::sync::Arc;

/// Storage key used when none is configured.
pub const DEFAULT_PERSISTENCE_KEY: &str = "walletAdapter";

/// Receives adapter errors that are not tied to a caller's pending call.
#[cfg(target_arch = "wasm32")]
pub type ErrorHandler = Arc<dyn Fn(&Error)>;

#[cfg(not(target_arch = "wasm32"))]
pub type ErrorHandler = Arc<dyn Fn(&Error) + Send + Sync>;

/// Opens a wallet's install page.
pub trait UrlOpener: MaybeSendSync {
    fn open(&self, url: &str);
}

/// Fallback opener for hosts without a browser: logs the install URL.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogUrlOpener;

impl UrlOpener for LogUrlOpener {
    fn open(&self, url: &str) {
        log::info!("Wallet is not ready. Install it from {url}");
    }
}

pub(crate) fn default_error_handler() -> ErrorHandler {
    Arc::new(|err: &Error| log::error!("Wallet error: {err:#}"))
}

/// Options for [`WalletStore::new`](crate::WalletStore::new).
///
/// # Example
///
/// ```rust,ignore
/// let options = StoreOptions::new(vec![phantom, solflare])
///     .with_storage(Arc::new(MemoryPreferenceStorage::new()))
///     .with_autoconnect(Arc::new(TokioSpawner))
///     .with_error_handler(|err| eprintln!("{err}"));
/// ```
pub struct StoreOptions {
    /// Wallets offered to the user.
    pub wallets: Vec<WalletDescriptor>,
    /// Key the selected wallet name is stored under.
    pub persistence_key: Option<String>,
    /// Connect automatically whenever the selected wallet is ready.
    pub autoconnect: bool,
    pub on_error: Option<ErrorHandler>,
    /// Preference storage. `None` disables persistence.
    pub storage: Option<Arc<dyn PreferenceStorage>>,
    /// Required when `autoconnect` is set.
    pub spawner: Option<Arc<dyn Spawner>>,
    pub url_opener: Option<Arc<dyn UrlOpener>>,
}

impl StoreOptions {
    pub fn new(wallets: Vec<WalletDescriptor>) -> Self {
        Self {
            wallets,
            persistence_key: None,
            autoconnect: false,
            on_error: None,
            storage: None,
            spawner: None,
            url_opener: None,
        }
    }

    pub fn with_persistence_key(mut self, key: impl Into<String>) -> Self {
        self.persistence_key = Some(key.into());
        self
    }

    pub fn with_storage(mut self, storage: Arc<dyn PreferenceStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Enable autoconnect; attempts run on `spawner`.
    pub fn with_autoconnect(mut self, spawner: Arc<dyn Spawner>) -> Self {
        self.autoconnect = true;
        self.spawner = Some(spawner);
        self
    }

    pub fn with_error_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Error) + MaybeSendSync + 'static,
    {
        self.on_error = Some(Arc::new(handler));
        self
    }

    pub fn with_url_opener(mut self, opener: Arc<dyn UrlOpener>) -> Self {
        self.url_opener = Some(opener);
        self
    }

    /// Effective persistence key.
    pub fn persistence_key(&self) -> &str {
        self.persistence_key
            .as_deref()
            .unwrap_or(DEFAULT_PERSISTENCE_KEY)
    }

    pub fn validate(&self) -> Result<()> {
        if self.persistence_key().is_empty() {
            return Err(Error::Config("persistence key must not be empty".into()));
        }
        if self.autoconnect && self.spawner.is_none() {
            return Err(Error::Config("autoconnect requires a spawner".into()));
        }
        Ok(())
    }
}
