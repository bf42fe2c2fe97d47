//! Registry of the wallets an application offers.

use crate::adapter::WalletAdapter;
use crate::error::{Error, Result};
use crate::runtime::MaybeSendSync;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builds a fresh adapter each time the wallet is selected.
#[cfg(target_arch = "wasm32")]
pub type AdapterFactory = Arc<dyn Fn() -> Arc<dyn WalletAdapter>>;

#[cfg(not(target_arch = "wasm32"))]
pub type AdapterFactory = Arc<dyn Fn() -> Arc<dyn WalletAdapter> + Send + Sync>;

/// A configured wallet: its name, where to install it, and how to build its adapter.
pub struct WalletDescriptor {
    name: String,
    url: String,
    icon: Option<String>,
    factory: AdapterFactory,
}

impl WalletDescriptor {
    pub fn new<F>(name: impl Into<String>, url: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> Arc<dyn WalletAdapter> + MaybeSendSync + 'static,
    {
        Self {
            name: name.into(),
            url: url.into(),
            icon: None,
            factory: Arc::new(factory),
        }
    }

    /// Attach an icon (URL or data URI) for wallet pickers.
    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Install page, opened when connecting to a wallet that is not ready.
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn icon(&self) -> Option<&str> {
        self.icon.as_deref()
    }

    /// Construct a new adapter instance.
    pub fn create_adapter(&self) -> Arc<dyn WalletAdapter> {
        (self.factory)()
    }

    pub fn info(&self) -> WalletInfo {
        WalletInfo {
            name: self.name.clone(),
            url: self.url.clone(),
            icon: self.icon.clone(),
        }
    }
}

impl fmt::Debug for WalletDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WalletDescriptor")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("icon", &self.icon)
            .finish_non_exhaustive()
    }
}

/// Plain description of a wallet, without its factory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletInfo {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

/// Immutable name → wallet lookup built once from configuration.
#[derive(Debug, Clone, Default)]
pub struct WalletRegistry {
    order: Vec<Arc<WalletDescriptor>>,
    by_name: HashMap<String, Arc<WalletDescriptor>>,
}

impl WalletRegistry {
    /// Build the registry. A later descriptor with an already used name
    /// replaces the earlier one.
    pub fn new(wallets: impl IntoIterator<Item = WalletDescriptor>) -> Self {
        let mut order: Vec<Arc<WalletDescriptor>> = Vec::new();
        let mut by_name = HashMap::new();

        for wallet in wallets {
            let wallet = Arc::new(wallet);
            if let Some(previous) = by_name.insert(wallet.name.clone(), wallet.clone()) {
                log::warn!("Wallet {} registered twice, keeping the last one", previous.name);
                order.retain(|w| !Arc::ptr_eq(w, &previous));
            }
            order.push(wallet);
        }

        Self { order, by_name }
    }

    pub fn get(&self, name: &str) -> Result<Arc<WalletDescriptor>> {
        self.by_name
            .get(name)
            .cloned()
            .ok_or_else(|| Error::WalletNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Wallet names in configuration order.
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(|w| w.name()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<WalletDescriptor>> {
        self.order.iter()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str, url: &str) -> WalletDescriptor {
        WalletDescriptor::new(name, url, || -> Arc<dyn WalletAdapter> {
            unreachable!("factory is not called in registry tests")
        })
    }

    #[test]
    fn test_lookup_by_name() {
        let registry = WalletRegistry::new(vec![
            descriptor("Phantom", "https://phantom.app"),
            descriptor("Solflare", "https://solflare.com"),
        ]);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["Phantom", "Solflare"]);
        assert_eq!(registry.get("Solflare").unwrap().url(), "https://solflare.com");
        assert!(registry.contains("Phantom"));
    }

    #[test]
    fn test_unknown_name_is_not_found() {
        let registry = WalletRegistry::new(vec![descriptor("Phantom", "https://phantom.app")]);

        let err = registry.get("Sollet").unwrap_err();
        assert_eq!(err, Error::WalletNotFound("Sollet".to_string()));
        // Names are case sensitive
        assert!(registry.get("phantom").is_err());
    }

    #[test]
    fn test_duplicate_name_keeps_last() {
        let registry = WalletRegistry::new(vec![
            descriptor("Phantom", "https://old.example"),
            descriptor("Solflare", "https://solflare.com"),
            descriptor("Phantom", "https://phantom.app"),
        ]);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names(), vec!["Solflare", "Phantom"]);
        assert_eq!(registry.get("Phantom").unwrap().url(), "https://phantom.app");
    }

    #[test]
    fn test_info_carries_icon() {
        let wallet = descriptor("Phantom", "https://phantom.app").with_icon("data:image/svg+xml,");
        let info = wallet.info();
        assert_eq!(info.name, "Phantom");
        assert_eq!(info.icon.as_deref(), Some("data:image/svg+xml,"));
    }
}
