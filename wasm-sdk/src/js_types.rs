//! WASM-friendly type wrappers.
//!
//! These types wrap the core SDK types with wasm_bindgen annotations
//! for seamless JavaScript interop.

use wasm_bindgen::prelude::*;
use walletstore_core as wallet_core;

/// Connection state of the selected wallet.
#[wasm_bindgen]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    NotReady,
    Ready,
    Connecting,
    Connected,
}

impl From<wallet_core::ConnectionState> for ConnectionState {
    fn from(state: wallet_core::ConnectionState) -> Self {
        match state {
            wallet_core::ConnectionState::NotReady => ConnectionState::NotReady,
            wallet_core::ConnectionState::Ready => ConnectionState::Ready,
            wallet_core::ConnectionState::Connecting => ConnectionState::Connecting,
            wallet_core::ConnectionState::Connected => ConnectionState::Connected,
        }
    }
}

/// Store snapshot as seen from JavaScript.
///
/// Signing is done through the store; the `can*` flags tell which signing
/// methods the selected wallet supports.
#[wasm_bindgen(getter_with_clone)]
#[derive(Debug, Clone)]
pub struct WalletSnapshot {
    #[wasm_bindgen(js_name = "walletName")]
    pub wallet_name: Option<String>,
    #[wasm_bindgen(js_name = "walletUrl")]
    pub wallet_url: Option<String>,
    #[wasm_bindgen(js_name = "walletIcon")]
    pub wallet_icon: Option<String>,
    /// Base58 public key, set while connected.
    #[wasm_bindgen(js_name = "publicKey")]
    pub public_key: Option<String>,
    pub state: ConnectionState,
    /// "Initializing", "Disconnected", "Connecting" or "Connected".
    #[wasm_bindgen(js_name = "stateLabel")]
    pub state_label: String,
    #[wasm_bindgen(js_name = "canSignTransaction")]
    pub can_sign_transaction: bool,
    #[wasm_bindgen(js_name = "canSignAllTransactions")]
    pub can_sign_all_transactions: bool,
    #[wasm_bindgen(js_name = "canSignMessage")]
    pub can_sign_message: bool,
}

impl From<&wallet_core::WalletSnapshot> for WalletSnapshot {
    fn from(snapshot: &wallet_core::WalletSnapshot) -> Self {
        let info = snapshot.wallet_info();
        let capabilities = snapshot.capabilities();
        Self {
            wallet_name: info.as_ref().map(|w| w.name.clone()),
            wallet_url: info.as_ref().map(|w| w.url.clone()),
            wallet_icon: info.and_then(|w| w.icon),
            public_key: snapshot.public_key.map(|k| k.to_string()),
            state: snapshot.state.into(),
            state_label: snapshot.state.label().to_string(),
            can_sign_transaction: capabilities.sign_transaction,
            can_sign_all_transactions: capabilities.sign_all_transactions,
            can_sign_message: capabilities.sign_message,
        }
    }
}
