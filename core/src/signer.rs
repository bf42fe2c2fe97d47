//! Capability-guarded signing handles.
//!
//! The store hands out one handle per signing operation the active adapter
//! implements. A handle is bound to the activation that produced it: once the
//! store switches adapters, or while the wallet is not connected, every call
//! fails with [`Error::WalletNotConnected`] before reaching the adapter.

use crate::adapter::WalletAdapter;
use crate::error::{Error, Result};
use crate::store::StoreInner;
use crate::types::Transaction;
use std::fmt;
use std::sync::{Arc, Weak};

/// Ties a handle to one adapter activation of one store.
#[derive(Clone)]
pub(crate) struct ActivationGuard {
    store: Weak<StoreInner>,
    activation: u64,
}

impl ActivationGuard {
    pub(crate) fn new(store: Weak<StoreInner>, activation: u64) -> Self {
        Self { store, activation }
    }

    fn check(&self) -> Result<()> {
        let store = self.store.upgrade().ok_or(Error::WalletNotConnected)?;
        store.ensure_connected(self.activation)
    }
}

/// Signs a single transaction.
#[derive(Clone)]
pub struct GuardedSignTransaction {
    guard: ActivationGuard,
    adapter: Arc<dyn WalletAdapter>,
}

impl GuardedSignTransaction {
    pub(crate) fn new(guard: ActivationGuard, adapter: Arc<dyn WalletAdapter>) -> Self {
        Self { guard, adapter }
    }

    pub async fn sign(&self, transaction: Transaction) -> Result<Transaction> {
        self.guard.check()?;
        let signer = self
            .adapter
            .as_sign_transaction()
            .ok_or(Error::UnsupportedOperation("signTransaction"))?;
        Ok(signer.sign_transaction(transaction).await?)
    }
}

/// Signs a batch of transactions.
#[derive(Clone)]
pub struct GuardedSignAllTransactions {
    guard: ActivationGuard,
    adapter: Arc<dyn WalletAdapter>,
}

impl GuardedSignAllTransactions {
    pub(crate) fn new(guard: ActivationGuard, adapter: Arc<dyn WalletAdapter>) -> Self {
        Self { guard, adapter }
    }

    pub async fn sign_all(&self, transactions: Vec<Transaction>) -> Result<Vec<Transaction>> {
        self.guard.check()?;
        let signer = self
            .adapter
            .as_sign_all_transactions()
            .ok_or(Error::UnsupportedOperation("signAllTransactions"))?;
        Ok(signer.sign_all_transactions(transactions).await?)
    }
}

/// Signs an arbitrary message.
#[derive(Clone)]
pub struct GuardedSignMessage {
    guard: ActivationGuard,
    adapter: Arc<dyn WalletAdapter>,
}

impl GuardedSignMessage {
    pub(crate) fn new(guard: ActivationGuard, adapter: Arc<dyn WalletAdapter>) -> Self {
        Self { guard, adapter }
    }

    pub async fn sign(&self, message: Vec<u8>) -> Result<Vec<u8>> {
        self.guard.check()?;
        let signer = self
            .adapter
            .as_sign_message()
            .ok_or(Error::UnsupportedOperation("signMessage"))?;
        Ok(signer.sign_message(message).await?)
    }
}

macro_rules! impl_handle_debug {
    ($($handle:ident),*) => {
        $(
            impl fmt::Debug for $handle {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.debug_struct(stringify!($handle))
                        .field("activation", &self.guard.activation)
                        .finish_non_exhaustive()
                }
            }
        )*
    };
}

impl_handle_debug!(
    GuardedSignTransaction,
    GuardedSignAllTransactions,
    GuardedSignMessage
);
