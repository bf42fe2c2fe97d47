//! Async storage abstraction for the selected-wallet preference.
//!
//! The store remembers one thing across sessions: the name of the last selected
//! wallet. The storage surface is injected so it can be backed by
//! `localStorage` in a browser, a file on native hosts, or memory in tests.
//! When no surface is configured, persistence is skipped silently.

use crate::error::Result;
use crate::runtime::MaybeSendSync;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Type alias for storage futures.
///
/// On WASM targets, futures don't need to be `Send` since JavaScript is single-threaded.
/// On native targets, futures should be `Send` to allow use with multi-threaded runtimes.
#[cfg(target_arch = "wasm32")]
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a>>;

#[cfg(not(target_arch = "wasm32"))]
pub type StorageFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// String-keyed preference storage.
///
/// # Example Implementation (TypeScript)
///
/// ```typescript
/// // In TypeScript, implement this as callbacks passed to the WASM SDK:
/// const storage = new JsPreferenceStorageProvider(
///     async (key) => localStorage.getItem(key),          // get
///     async (key, value) => localStorage.setItem(key, value), // set
/// );
/// ```
pub trait PreferenceStorage: MaybeSendSync {
    /// Read the value stored under `key`.
    ///
    /// Returns `Ok(None)` if nothing has been stored.
    fn get(&self, key: &str) -> StorageFuture<'_, Option<String>>;

    /// Store `value` under `key`, overwriting any existing value.
    fn set(&self, key: &str, value: &str) -> StorageFuture<'_, ()>;
}

/// Best-effort persistence of the selected wallet name.
#[derive(Clone)]
pub struct SelectionPersistence {
    key: String,
    storage: Option<Arc<dyn PreferenceStorage>>,
}

impl SelectionPersistence {
    pub fn new(key: impl Into<String>, storage: Option<Arc<dyn PreferenceStorage>>) -> Self {
        Self {
            key: key.into(),
            storage,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether a storage surface is configured.
    pub fn is_available(&self) -> bool {
        self.storage.is_some()
    }

    /// Load the saved wallet name.
    ///
    /// Returns `None` when no storage is configured, nothing (or an empty name)
    /// is stored, or the read fails.
    pub async fn load(&self) -> Option<String> {
        let storage = self.storage.as_ref()?;
        match storage.get(&self.key).await {
            Ok(Some(name)) if !name.is_empty() => Some(name),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Could not read saved wallet from {}: {e:#}", self.key);
                None
            }
        }
    }

    /// Save the selected wallet name, or an empty string for no wallet.
    pub async fn save(&self, name: Option<&str>) {
        let Some(storage) = self.storage.as_ref() else {
            return;
        };
        let value = name.unwrap_or_default();
        if let Err(e) = storage.set(&self.key, value).await {
            log::warn!("Could not save selected wallet to {}: {e:#}", self.key);
        }
    }
}

impl std::fmt::Debug for SelectionPersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectionPersistence")
            .field("key", &self.key)
            .field("available", &self.is_available())
            .finish()
    }
}

/// In-memory preference storage.
pub mod memory {
    use super::*;
    use crate::runtime::lock;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Simple in-memory preference storage for native hosts and tests.
    #[derive(Default)]
    pub struct MemoryPreferenceStorage {
        values: Mutex<HashMap<String, String>>,
    }

    impl MemoryPreferenceStorage {
        /// Create a new empty memory storage.
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a storage pre-populated with one value.
        pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
            let storage = Self::new();
            lock(&storage.values).insert(key.into(), value.into());
            storage
        }

        /// Synchronous peek, for assertions.
        pub fn value(&self, key: &str) -> Option<String> {
            lock(&self.values).get(key).cloned()
        }
    }

    impl PreferenceStorage for MemoryPreferenceStorage {
        fn get(&self, key: &str) -> StorageFuture<'_, Option<String>> {
            let key = key.to_string();
            Box::pin(async move { Ok(lock(&self.values).get(&key).cloned()) })
        }

        fn set(&self, key: &str, value: &str) -> StorageFuture<'_, ()> {
            let key = key.to_string();
            let value = value.to_string();
            Box::pin(async move {
                lock(&self.values).insert(key, value);
                Ok(())
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryPreferenceStorage;
    use super::*;
    use crate::error::Error;

    struct FailingStorage;

    impl PreferenceStorage for FailingStorage {
        fn get(&self, _key: &str) -> StorageFuture<'_, Option<String>> {
            Box::pin(async { Err(Error::Storage("quota exceeded".into())) })
        }

        fn set(&self, _key: &str, _value: &str) -> StorageFuture<'_, ()> {
            Box::pin(async { Err(Error::Storage("quota exceeded".into())) })
        }
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let storage = Arc::new(MemoryPreferenceStorage::new());
        let persistence = SelectionPersistence::new("walletAdapter", Some(storage.clone()));

        assert_eq!(persistence.load().await, None);

        persistence.save(Some("Phantom")).await;
        assert_eq!(storage.value("walletAdapter").as_deref(), Some("Phantom"));
        assert_eq!(persistence.load().await.as_deref(), Some("Phantom"));

        // Deselection is stored as an empty string and reads back as nothing
        persistence.save(None).await;
        assert_eq!(storage.value("walletAdapter").as_deref(), Some(""));
        assert_eq!(persistence.load().await, None);
    }

    #[tokio::test]
    async fn test_absent_storage_is_skipped() {
        let persistence = SelectionPersistence::new("walletAdapter", None);
        assert!(!persistence.is_available());

        persistence.save(Some("Phantom")).await;
        assert_eq!(persistence.load().await, None);
    }

    #[tokio::test]
    async fn test_storage_failures_are_swallowed() {
        let persistence = SelectionPersistence::new("walletAdapter", Some(Arc::new(FailingStorage)));

        persistence.save(Some("Phantom")).await;
        assert_eq!(persistence.load().await, None);
    }
}
