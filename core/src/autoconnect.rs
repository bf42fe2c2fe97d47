//! Automatic connection whenever the selected wallet becomes ready.

use crate::observable::Subscription;
use crate::runtime::Spawner;
use crate::store::WalletStore;
use crate::types::ConnectionState;
use std::sync::Arc;

/// Watches a store and requests a connection each time its state is `Ready`.
///
/// A failed attempt returns the store to `Ready`, which triggers another
/// attempt; the adapter's own pacing (a user dismissing a popup) bounds this.
pub struct Autoconnect {
    subscription: Subscription,
}

impl Autoconnect {
    /// Subscribe to `store`. Connection attempts run on `spawner`.
    pub fn attach(store: &WalletStore, spawner: Arc<dyn Spawner>) -> Self {
        let weak = store.downgrade();
        let subscription = store.subscribe(move |snapshot| {
            if snapshot.state != ConnectionState::Ready {
                return;
            }
            let Some(store) = weak.upgrade() else {
                return;
            };
            let name = snapshot.wallet_name().unwrap_or_default().to_string();
            spawner.spawn(Box::pin(async move {
                log::debug!("Autoconnecting to {name}");
                if let Err(e) = store.connect().await {
                    log::warn!("Autoconnect to {name} failed: {e}");
                }
            }));
        });
        Self { subscription }
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_active()
    }

    /// Stop watching. Attempts already spawned still run to completion.
    pub fn detach(self) {
        self.subscription.unsubscribe();
    }
}

impl std::fmt::Debug for Autoconnect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Autoconnect")
            .field("attached", &self.is_attached())
            .finish()
    }
}
